use crate::error::FetchError;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson};
use reqwest::{Client, Response};
use url::Url;

/// Turns a non-success response into `FetchError::Status`, keeping the body
/// for diagnostics.
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        url,
        status: status.as_u16(),
        body,
    }
    .into())
}

pub async fn get_feature_collection(client: &Client, url: Url) -> Result<FeatureCollection> {
    tracing::debug!(%url, "Fetching GeoJSON");
    let response = check_status(client.get(url.clone()).send().await?).await?;
    let text = response.text().await?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("Response from {} is not GeoJSON", url))?;
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => return Ok(fc),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature::from(g)],
    };
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Minimal HTTP/1.1 server answering each connection with the next canned
/// response, recording the raw requests it saw.
#[cfg(test)]
pub(crate) mod stub {
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use url::Url;

    pub struct Stub {
        pub url: Url,
        pub requests: Arc<Mutex<Vec<String>>>,
    }

    impl Stub {
        pub fn request(&self, index: usize) -> String {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    /// Client that talks to the stub directly, ignoring any proxy settings.
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    pub async fn serve(responses: Vec<(u16, &str)>) -> Stub {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(vec![]));
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let seen = requests.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                seen.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        Stub {
            url: Url::parse(&format!("http://{}/api/", addr)).unwrap(),
            requests,
        }
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = vec![];
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }
}
