use futures::future::try_join_all;
use tracing::debug;

use super::KvPutter;
use crate::constants::FILL_CONCURRENCY;
use crate::constants::FILL_KEY_COUNT;
use crate::util::rand_string;
use crate::Error;
use crate::Result;

/// Load roughly `db_size` bytes into the cluster.
///
/// Writes keys `"0"` to `"99"` from concurrent writers, each value sized
/// `db_size / 100`. The first failed write aborts the load and is returned;
/// writes still in flight on other writers are dropped.
pub async fn fill_with_data<P>(
    client: &P,
    db_size: usize,
) -> Result<()>
where
    P: KvPutter + ?Sized,
{
    let keys_per_writer = FILL_KEY_COUNT / FILL_CONCURRENCY;
    let value_size = db_size / FILL_KEY_COUNT;
    debug!(
        "filling {} keys of {} bytes with {} writers",
        FILL_KEY_COUNT, value_size, FILL_CONCURRENCY
    );

    let writers = (0..FILL_CONCURRENCY).map(|i| async move {
        for j in 0..keys_per_writer {
            let key = (i * keys_per_writer + j).to_string();
            client.put(key, rand_string(value_size)).await?;
        }
        Ok::<(), Error>(())
    });

    try_join_all(writers).await?;
    Ok(())
}
