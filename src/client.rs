// src/client.rs

use crate::{config::FetchConfig, error::*};
use reqwest::{IntoUrl, Response, header};

#[derive(Clone)]
pub struct RobustClient {
    pub client: reqwest::Client,
}

impl RobustClient {
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }

    /// 发起 GET 请求，非 2xx 状态视为错误
    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self
            .client
            .get(url)
            .header(header::ACCEPT, "*/*")
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(AppError::HttpStatus(res.status()));
        }
        Ok(res)
    }
}
