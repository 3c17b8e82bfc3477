use reqwest::blocking::Client;
use std::time::Duration;

use crate::error::Result;
use crate::logger::PipelineLogger;

/// Blocking client shared by both downloads. `None` means no timeout.
pub fn make_http_client(timeout: Option<Duration>) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("firds-etl/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// GETs the search endpoint and returns the body decoded with its declared
/// charset (UTF-8 when none is given).
pub fn fetch_search_result(client: &Client, logger: &dyn PipelineLogger, url: &str) -> Result<String> {
    match get_text(client, url) {
        Ok(body) => {
            logger.info("Initial XML Loaded Successfully");
            Ok(body)
        }
        Err(e) => {
            logger.warning("Initial XML Failed To Load");
            logger.warning(&e.to_string());
            Err(e)
        }
    }
}

fn get_text(client: &Client, url: &str) -> Result<String> {
    let body = client.get(url).send()?.error_for_status()?.text()?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::testing::RecordingLogger;

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let client = make_http_client(Some(Duration::from_secs(5))).unwrap();
        let logger = RecordingLogger::default();

        // nothing listens on port 1
        let err = fetch_search_result(&client, &logger, "http://127.0.0.1:1/select").unwrap_err();
        assert!(err.is_transport_error());
        assert_eq!(logger.warnings.borrow()[0], "Initial XML Failed To Load");
        assert_eq!(logger.warnings.borrow().len(), 2);
        assert!(logger.infos.borrow().is_empty());
    }
}
