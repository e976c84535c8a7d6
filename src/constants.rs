// Upstream service
pub const DEFAULT_BASE_URL: &str = "https://opendata.aemet.es/opendata/api";
pub const API_KEY_PLACEHOLDER: &str = "{apiKey}";
pub const API_KEY_ENV: &str = "AEMET_API_KEY";

// Retry protocol
pub const MAX_PASSES: u32 = 3;
pub const BACKOFF_UNIT_MS: u64 = 1000;
pub const BACKOFF_CAP_UNITS: u64 = 30;
pub const METADATA_TIMEOUT_SECS: u64 = 10;
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

// Archive extraction
pub const FALLBACK_ENTRY_NAME: &str = "descargado";
pub const TAR_MAGIC_OFFSET: usize = 257;

// Dataset chunking
pub const MONTHLY_WINDOW_YEARS: i32 = 3;
pub const DAILY_WINDOW_MONTHS: u32 = 5;
pub const DAILY_WINDOW_EXTRA_DAYS: i64 = 29;
pub const WARNINGS_WINDOW_DAYS: i64 = 1;

// Climatology extreme parameters requested when none are given
pub const DEFAULT_EXTREME_PARAMETERS: &[&str] = &["P", "T", "V"];

// CLI preview length (characters) when no output file is given
pub const PREVIEW_CHARS: usize = 500;

/// AEMET warning area codes and their names.
pub const AREA_CODES: &[(&str, &str)] = &[
    ("esp", "España"),
    ("61", "Andalucía"),
    ("62", "Aragón"),
    ("63", "Asturias, Principado de"),
    ("64", "Ballears, Illes"),
    ("78", "Ceuta"),
    ("65", "Canarias"),
    ("66", "Cantabria"),
    ("67", "Castilla y León"),
    ("68", "Castilla - La Mancha"),
    ("69", "Cataluña"),
    ("77", "Comunitat Valenciana"),
    ("70", "Extremadura"),
    ("71", "Galicia"),
    ("72", "Madrid, Comunidad de"),
    ("79", "Melilla"),
    ("73", "Murcia, Región de"),
    ("74", "Navarra, Comunidad Foral de"),
    ("75", "País Vasco"),
    ("76", "Rioja, La"),
];
