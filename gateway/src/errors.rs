use std::io;

use cms_client::error::CmsError;

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CMS client error: {0}")]
    Client(#[from] CmsError),
}
