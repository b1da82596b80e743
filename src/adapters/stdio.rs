//! JSON-lines driving adapter
//!
//! Each input line is one use-case envelope, tagged with the operation to run:
//!
//! ```json
//! {"op": "enrollToPromo", "id": "<member id>", "info": {"promo": "<promo id>"}, "source": {}}
//! ```
//!
//! Each output line is a [`Reply`] carrying an HTTP-like status code.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tower::ServiceExt;
use tracing::{debug, warn};

use crate::{
    commands::{
        enroll::EnrollToPromoRequest,
        promos::{
            DeletePromoRequest, InsertPromoRequest, SelectAllPromosRequest, SelectOnePromoRequest,
            UpdatePromoRequest,
        },
        EnrollmentLogic, Error, ErrorKind, PromoLifecycle,
    },
    ports::{enrollment::EnrollmentStore, member::MemberStore, promo::PromoStore},
};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    InsertPromo(InsertPromoRequest),
    UpdatePromo(UpdatePromoRequest),
    SelectOnePromo(SelectOnePromoRequest),
    SelectAllPromos(SelectAllPromosRequest),
    DeletePromo(DeletePromoRequest),
    EnrollToPromo(EnrollToPromoRequest),
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Reply {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ErrorBody {
    /// `None` when the line could not be understood at all
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Reply {
    fn success<T: Serialize>(status: u16, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status,
                data: Some(data),
                error: None,
            },
            Err(err) => Self::failure(500, None, err.to_string()),
        }
    }

    fn failure(status: u16, kind: Option<ErrorKind>, message: String) -> Self {
        Self {
            status,
            data: None,
            error: Some(ErrorBody { kind, message }),
        }
    }
}

impl From<Error> for Reply {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::NotFound => 404,
            ErrorKind::StoreUnavailable => 503,
            _ => 400,
        };

        Self::failure(status, Some(kind), err.to_string())
    }
}

/// Routes decoded commands to the use cases
pub struct StdioAdapter<P, M, E> {
    promos: PromoLifecycle<P>,
    enrollment: EnrollmentLogic<P, M, E>,
}

impl<P, M, E> StdioAdapter<P, M, E>
where
    P: PromoStore + Send + Sync + 'static,
    M: MemberStore + Send + Sync + 'static,
    E: EnrollmentStore + Send + Sync + 'static,
{
    pub fn new(promos: PromoLifecycle<P>, enrollment: EnrollmentLogic<P, M, E>) -> Self {
        Self { promos, enrollment }
    }

    /// Read commands until end of input, answering each one on its own line
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let reply = self.handle_line(&line).await;
            let mut encoded = serde_json::to_vec(&reply)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }

        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Reply {
        match serde_json::from_str::<Command>(line) {
            Ok(command) => self.dispatch(command).await,
            Err(err) => {
                warn!(error = %err, "malformed command");
                Reply::failure(400, None, err.to_string())
            }
        }
    }

    pub async fn dispatch(&self, command: Command) -> Reply {
        debug!(?command, "dispatching");
        let promos = self.promos.clone();

        let res = match command {
            Command::InsertPromo(req) => {
                promos.oneshot(req).await.map(|promo| Reply::success(201, promo))
            }
            Command::UpdatePromo(req) => {
                promos.oneshot(req).await.map(|promo| Reply::success(200, promo))
            }
            Command::SelectOnePromo(req) => {
                promos.oneshot(req).await.map(|promo| Reply::success(200, promo))
            }
            Command::SelectAllPromos(req) => {
                promos.oneshot(req).await.map(|list| Reply::success(200, list))
            }
            Command::DeletePromo(req) => {
                promos.oneshot(req).await.map(|deleted| Reply::success(200, deleted))
            }
            Command::EnrollToPromo(req) => self
                .enrollment
                .clone()
                .oneshot(req)
                .await
                .map(|request| Reply::success(201, request)),
        };

        res.unwrap_or_else(Reply::from)
    }
}
