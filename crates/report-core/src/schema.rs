//! Column names of the NYPD shooting-incident dataset and the derived columns
//! the pipeline adds.

pub const INCIDENT_KEY: &str = "INCIDENT_KEY";
pub const OCCUR_DATE: &str = "OCCUR_DATE";
pub const OCCUR_TIME: &str = "OCCUR_TIME";
pub const BORO: &str = "BORO";
pub const PRECINCT: &str = "PRECINCT";
pub const JURISDICTION_CODE: &str = "JURISDICTION_CODE";
pub const LOCATION_DESC: &str = "LOCATION_DESC";
pub const STATISTICAL_MURDER_FLAG: &str = "STATISTICAL_MURDER_FLAG";

/// Added by the cleaner from `OCCUR_DATE` + `OCCUR_TIME`.
pub const OCCUR_DATETIME: &str = "OCCUR_DATETIME";
/// Added by the aggregator.
pub const OCCUR_YEAR: &str = "OCCUR_YEAR";
/// Added by the aggregator.
pub const OCCUR_HOUR: &str = "OCCUR_HOUR";

/// Victim/suspect demographics and geocoordinates (columns 9 through 19 of
/// the published file). Never part of the working table after cleaning.
pub const DEMOGRAPHIC_AND_LOCATION_COLUMNS: &[&str] = &[
    "PERP_AGE_GROUP",
    "PERP_SEX",
    "PERP_RACE",
    "VIC_AGE_GROUP",
    "VIC_SEX",
    "VIC_RACE",
    "X_COORD_CD",
    "Y_COORD_CD",
    "Latitude",
    "Longitude",
    "Lon_Lat",
];

/// Every retained record must carry these.
pub const REQUIRED_COLUMNS: &[&str] = &[BORO, OCCUR_DATE, OCCUR_TIME, STATISTICAL_MURDER_FLAG];

/// Columns reinterpreted as data-driven categories.
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    INCIDENT_KEY,
    BORO,
    PRECINCT,
    JURISDICTION_CODE,
    LOCATION_DESC,
    STATISTICAL_MURDER_FLAG,
];

/// Default NYC open-data endpoint for the historic shooting-incident file.
pub const DEFAULT_SOURCE_URL: &str =
    "https://data.cityofnewyork.us/api/views/833y-ss6m/rows.csv?accessType=DOWNLOAD";
