//! Column names the pipeline relies on.

pub const ID: &str = "id";
pub const CAR_ID: &str = "car_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const CITY_ID: &str = "city_id";

pub const PICKUP_TIME: &str = "pickup_time";
pub const DROPOFF_TIME: &str = "dropoff_time";
pub const PICKUP_DATE: &str = "pickup_date";
pub const DISTANCE: &str = "distance";
pub const REVENUE: &str = "revenue";

pub const BRAND: &str = "brand";
pub const MODEL: &str = "model";
pub const CITY_NAME: &str = "city_name";

/// Identifier columns removed once the joins are done.
pub const REDUNDANT_IDS: &[&str] = &[ID, CAR_ID, CITY_ID, CUSTOMER_ID];
