use soroban_sdk::Env;

use crate::error::Error;
use crate::storage::{DataKey, GuardKey};

/// Marks a listing or position as mid-operation for the rest of the call.
///
/// The flag lives in temporary storage and is dropped again by `release`;
/// a failed call rolls it back together with every other write.
pub fn acquire(env: &Env, key: GuardKey) -> Result<(), Error> {
    let key = DataKey::Guard(key);
    if env.storage().temporary().has(&key) {
        return Err(Error::Reentrancy);
    }
    env.storage().temporary().set(&key, &true);
    Ok(())
}

pub fn release(env: &Env, key: GuardKey) {
    env.storage().temporary().remove(&DataKey::Guard(key));
}

/// Runs `f` with `keys` held, releasing them on success.
pub fn with_guards<T, F>(env: &Env, keys: &[GuardKey], f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    for key in keys {
        acquire(env, key.clone())?;
    }
    let result = f()?;
    for key in keys {
        release(env, key.clone());
    }
    Ok(result)
}
