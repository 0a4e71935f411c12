use futures::Stream;
use futures::TryStreamExt;
use reqwest::Client;
use thiserror::Error;

use super::models::HttpConfig;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    BadStatus {
        status: reqwest::StatusCode,
        url: String,
    },
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Opens a streamed GET.
    /// Returns (content-length if the server sent one, body stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.client.get(download_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus {
                status,
                url: download_url.to_string(),
            });
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_reports_content_length() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/file.bin")
            .with_status(200)
            .with_body(vec![1u8; 300])
            .create_async()
            .await;

        let client = ApiClient::new(&HttpConfig::default()).unwrap();
        let (total, stream) = client
            .download_file_stream(&format!("{}/file.bin", server.url()))
            .await
            .unwrap();
        assert_eq!(total, Some(300));

        let chunks: Vec<bytes::Bytes> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), 300);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = ApiClient::new(&HttpConfig::default()).unwrap();
        let result = client
            .download_file_stream(&format!("{}/missing", server.url()))
            .await;
        match result {
            Err(ApiError::BadStatus { status, .. }) => assert_eq!(status.as_u16(), 404),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
