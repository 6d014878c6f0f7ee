//! Application codes: the fixed set of business applications a service can belong to.

use crate::errors::ModelError;

pub const APPLICATION_CODES: [&str; 19] = [
    "abb", "acp", "aep", "ami", "amp", "bpx", "can", "djd", "fcs", "ibo", "ikc", "ino", "lsg",
    "mbr", "nxn", "osn", "rok", "wso", "xsf",
];

pub fn is_known(code: &str) -> bool {
    APPLICATION_CODES.contains(&code)
}

/// Trim and lowercase `code`, rejecting anything outside [`APPLICATION_CODES`].
/// Blank input means "no application".
pub fn normalize(code: Option<&str>) -> Result<Option<String>, ModelError> {
    let Some(raw) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let lower = raw.to_ascii_lowercase();
    if !is_known(&lower) {
        return Err(ModelError::Validation(format!("unknown application code: {raw}")));
    }
    Ok(Some(lower))
}
