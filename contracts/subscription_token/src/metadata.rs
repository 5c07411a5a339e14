use soroban_sdk::{Env, String};

use crate::error::Error;

pub const MAX_SERVICE_ID_LEN: u32 = 64;
pub const MAX_BASE_URI_LEN: u32 = 200;
pub const MAX_SYMBOL_LEN: u32 = 12;

// u32::MAX has 10 decimal digits
const MAX_ID_DIGITS: usize = 10;

/// Service ids are 1..=64 bytes of printable, non-space ASCII.
pub fn validate_service_id(service_id: &String) -> Result<(), Error> {
    let len = service_id.len();
    if len == 0 || len > MAX_SERVICE_ID_LEN {
        return Err(Error::InvalidParameters);
    }

    let mut buf = [0u8; MAX_SERVICE_ID_LEN as usize];
    let bytes = &mut buf[..len as usize];
    service_id.copy_into_slice(bytes);

    if bytes.iter().all(|b| (0x21..=0x7e).contains(b)) {
        Ok(())
    } else {
        Err(Error::InvalidParameters)
    }
}

pub fn validate_collection(name: &String, symbol: &String, base_uri: &String) -> Result<(), Error> {
    if name.len() == 0 || symbol.len() == 0 || symbol.len() > MAX_SYMBOL_LEN {
        return Err(Error::InvalidParameters);
    }
    validate_base_uri(base_uri)
}

pub fn validate_base_uri(base_uri: &String) -> Result<(), Error> {
    if base_uri.len() > MAX_BASE_URI_LEN {
        return Err(Error::InvalidParameters);
    }
    Ok(())
}

/// `base_uri` followed by the decimal token id.
pub fn token_uri(env: &Env, base_uri: &String, token_id: u32) -> String {
    let base_len = base_uri.len() as usize;
    let mut buf = [0u8; MAX_BASE_URI_LEN as usize + MAX_ID_DIGITS];
    base_uri.copy_into_slice(&mut buf[..base_len]);

    let mut digits = [0u8; MAX_ID_DIGITS];
    let mut n = token_id;
    let mut count = 0;
    loop {
        digits[count] = b'0' + (n % 10) as u8;
        count += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    for i in 0..count {
        buf[base_len + i] = digits[count - 1 - i];
    }

    String::from_bytes(env, &buf[..base_len + count])
}
