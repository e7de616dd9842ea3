//! Interactive dashboard session.
//!
//! Holds the table cache together with the current brand selection and
//! rebuilds the report whenever either changes.

use carshare_core::error::Result;
use carshare_data::analysis::{build_report, DashboardReport};
use carshare_data::filter::BrandFilter;

use crate::data_manager::{DataManager, TableLoader};

pub struct DashboardSession<L> {
    manager: DataManager<L>,
    filter: BrandFilter,
}

impl<L: TableLoader> DashboardSession<L> {
    pub fn new(manager: DataManager<L>, filter: BrandFilter) -> Self {
        Self { manager, filter }
    }

    pub fn filter(&self) -> &BrandFilter {
        &self.filter
    }

    pub fn manager(&self) -> &DataManager<L> {
        &self.manager
    }

    /// Replace the whole selection.
    pub fn set_brands<I, S>(&mut self, brands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = BrandFilter::new(brands);
    }

    /// Flip one brand in the selection. Returns whether it is now selected.
    pub fn toggle_brand(&mut self, brand: &str) -> bool {
        let selected = self.filter.toggle(brand);
        tracing::debug!(brand, selected, "brand toggled");
        selected
    }

    /// Drop the selection so every brand is shown.
    pub fn clear_brands(&mut self) {
        self.filter.clear();
    }

    /// Build the report for the current selection.
    ///
    /// Tables come from the cache unless `force_reload` is set or the cache
    /// expired.
    pub fn refresh(&mut self, force_reload: bool) -> Result<DashboardReport> {
        let tables = self.manager.get_tables(force_reload)?;
        build_report(&tables, &self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use carshare_core::models::{SourceTables, Table, Value};

    struct FixtureLoader {
        calls: Cell<usize>,
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    impl TableLoader for FixtureLoader {
        fn load(&self) -> Result<SourceTables> {
            self.calls.set(self.calls.get() + 1);
            let cols = |c: &[&str]| c.iter().map(|s| s.to_string()).collect::<Vec<_>>();
            Ok(SourceTables {
                trips: Table::from_rows(
                    "trips",
                    cols(&["id", "car_id", "customer_id", "distance"]),
                    vec![
                        vec![Value::Int(1), Value::Int(1), Value::Int(1), Value::Int(5)],
                        vec![Value::Int(2), Value::Int(2), Value::Int(1), Value::Int(7)],
                    ],
                ),
                cars: Table::from_rows(
                    "cars",
                    cols(&["id", "brand", "model", "city_id"]),
                    vec![
                        vec![Value::Int(1), text("Kia"), text("Rio"), Value::Int(1)],
                        vec![Value::Int(2), text("Audi"), text("A3"), Value::Int(1)],
                    ],
                ),
                cities: Table::from_rows(
                    "cities",
                    cols(&["city_id", "city_name"]),
                    vec![vec![Value::Int(1), text("Porto")]],
                ),
                customers: Table::new("customers", cols(&["id"])),
                ratings: Table::default(),
            })
        }
    }

    fn session() -> DashboardSession<FixtureLoader> {
        let loader = FixtureLoader {
            calls: Cell::new(0),
        };
        DashboardSession::new(DataManager::new(loader, None), BrandFilter::all())
    }

    #[test]
    fn test_refresh_reuses_cached_tables() {
        let mut s = session();
        let all = s.refresh(false).unwrap();
        assert_eq!(all.metrics.total_trips, 2);

        s.toggle_brand("Kia");
        let kia = s.refresh(false).unwrap();
        assert_eq!(kia.metrics.total_trips, 1);
        assert_eq!(s.manager().loader().calls.get(), 1);

        s.refresh(true).unwrap();
        assert_eq!(s.manager().loader().calls.get(), 2);
    }

    #[test]
    fn test_selection_changes() {
        let mut s = session();
        s.set_brands(["Kia", "Audi"]);
        assert_eq!(s.refresh(false).unwrap().metrics.total_trips, 2);

        assert!(!s.toggle_brand("Kia"));
        assert_eq!(s.filter().brands().collect::<Vec<_>>(), vec!["Audi"]);

        s.clear_brands();
        assert!(s.filter().is_empty());
        let report = s.refresh(false).unwrap();
        assert_eq!(report.available_brands, vec!["Audi", "Kia"]);
    }
}
