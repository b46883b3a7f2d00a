use log::warn;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Runs `call` up to three times, sleeping 1s then 2s between attempts.
/// Transient transport failures from the API are the expected customers here;
/// the last error is returned once the attempts are exhausted.
pub(crate) async fn with_retry<T, E, F, Fut>(what: &str, mut call: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS => {
                let delay = BASE_DELAY * 2u32.pow(attempt - 1);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}s",
                    what,
                    attempt,
                    MAX_ATTEMPTS,
                    err,
                    delay.as_secs()
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
