use std::sync::Arc;

use common::mail::Mailer;

use crate::config::AppConfig;
use crate::store::Store;
use crate::utils::jwt::TokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: TokenIssuer,
    pub config: AppConfig,
}
