//! Fetch a URL through `HttpClient` and print the body
//!
//! Usage: `tether-http-get [--dump] <url>`

use anyhow::{bail, Result};
use tether_http::{HttpClient, HttpError};
use tether_tools::bin_common::{init_tracing, parse_args};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("info");

    let args = parse_args();
    let dump = args.iter().any(|arg| arg == "--dump");
    let Some(url) = args.iter().find(|arg| !arg.starts_with("--")) else {
        bail!("usage: tether-http-get [--dump] <url>");
    };

    let mut http = HttpClient::default();
    if dump {
        http = http.dump();
    }

    let request = http.get(url.as_str()).build()?;
    let body = http
        .execute_with(request, |response| async move {
            response.text().await.map_err(HttpError::from)
        })
        .await?;

    println!("{}", body);
    Ok(())
}
