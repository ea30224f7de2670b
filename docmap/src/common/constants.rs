// doc constants
pub const DOC_ID: &str = "_id";

// field path separator used by dotted reads
pub const FIELD_SEPARATOR: &str = ".";

// object id constants
pub const OBJECT_ID_LENGTH: usize = 12;
pub const OBJECT_ID_HEX_LENGTH: usize = 24;

// Compile-time assertion for object id sizes
const _: () = {
    const _: [(); 1] = [(); (OBJECT_ID_HEX_LENGTH == OBJECT_ID_LENGTH * 2) as usize];
};

// collection log constants
pub const LOG_DB_PREFIX: &str = "db";
pub const LOG_ARG_SEPARATOR: &str = ", ";

pub const DOCMAP_VERSION: &str = env!("CARGO_PKG_VERSION");
