use tenebra_config::Constants;
use tenebra_core::crypto::{auth_hash, make_v2_address};
use tenebra_core::{Address, AuthLogType, TenebraError};
use tenebra_storage::{addresses, auth_log, PgStore};
use tracing::warn;

use crate::RequestMeta;

/// Look the address up, bind the key hash on first contact, compare
/// afterwards. Always returns the row so callers can report on locked or
/// fresh addresses uniformly.
pub async fn verify(
    store: &PgStore,
    meta: &RequestMeta,
    address: &str,
    private_key: &str,
) -> Result<(bool, Address), TenebraError> {
    let hash = auth_hash(address, private_key);

    let result = match addresses::get(store.pool(), address).await? {
        None => {
            let row = addresses::create(store.pool(), address, Some(&hash)).await?;
            (true, row)
        }
        Some(row) if row.privatekey_hash.is_none() => {
            addresses::set_privatekey_hash(store.pool(), address, &hash).await?;
            let row = Address { privatekey_hash: Some(hash), ..row };
            (true, row)
        }
        Some(row) => {
            let authed = !row.locked && row.privatekey_hash.as_deref() == Some(hash.as_str());
            (authed, row)
        }
    };

    log_attempt(store, meta, address, AuthLogType::Auth).await;
    Ok(result)
}

/// Derives the v2 address from the private key, runs [`verify`], and turns a
/// failed comparison into `AuthFailed`.
pub async fn authenticate(
    store: &PgStore,
    meta: &RequestMeta,
    private_key: &str,
    constants: &Constants,
) -> Result<Address, TenebraError> {
    let address = make_v2_address(private_key, constants.address_prefix);
    let (authed, row) = verify(store, meta, &address, private_key).await?;
    if !authed {
        return Err(TenebraError::AuthFailed);
    }
    Ok(row)
}

/// Appends to the auth log unless the same `(ip, address, type)` triple was
/// seen within the dedup window. Log failures never fail the request.
pub async fn log_attempt(store: &PgStore, meta: &RequestMeta, address: &str, log_type: AuthLogType) {
    let Some(ip) = meta.ip.as_deref() else { return };
    let result = async {
        if auth_log::recent_exists(store.pool(), ip, address, log_type).await? {
            return Ok::<_, TenebraError>(());
        }
        auth_log::insert(
            store.pool(),
            ip,
            address,
            log_type,
            meta.useragent.as_deref(),
            meta.origin.as_deref(),
        )
        .await
    }
    .await;
    if let Err(err) = result {
        warn!(%address, ?log_type, "failed to write auth log entry: {err}");
    }
}
