//! Raw socket ingress.
//!
//! Each connection carries exactly one frame of at most [`MAX_FRAME_LEN`]
//! bytes. The frame is decoded into a deposit in the configured currency and
//! the connection receives a one-line plain text verdict.

use crate::domain::payment::{Action, PaymentRequest};
use crate::domain::ports::PaymentServiceRef;
use crate::error::{PaymentError, Result};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

pub const MAX_FRAME_LEN: usize = 1024;
pub const REPLY_SUCCESS: &str = "Payment processed successfully";
pub const REPLY_FAILURE: &str = "Payment processing failed";

/// A payment decoded from a socket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayment {
    pub user_id: String,
    pub amount: i64,
}

/// Decodes a single frame.
pub trait FrameParser: Send + Sync {
    fn parse(&self, frame: &[u8]) -> Result<FramePayment>;
}

/// Parses UTF-8 frames shaped `<userId>|<amount>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedFrameParser;

impl FrameParser for DelimitedFrameParser {
    fn parse(&self, frame: &[u8]) -> Result<FramePayment> {
        let text = std::str::from_utf8(frame)
            .map_err(|e| PaymentError::validation(format!("frame is not UTF-8: {e}")))?;
        let (user_id, amount) = text
            .trim()
            .split_once('|')
            .ok_or_else(|| PaymentError::validation("frame is missing the '|' delimiter"))?;
        let amount = amount
            .trim()
            .parse::<i64>()
            .map_err(|e| PaymentError::validation(format!("invalid amount in frame: {e}")))?;
        Ok(FramePayment {
            user_id: user_id.trim().to_string(),
            amount,
        })
    }
}

/// Accepts socket connections and forwards their payments to the service.
pub struct TcpIngress {
    payments: PaymentServiceRef,
    parser: Arc<dyn FrameParser>,
    currency: String,
}

impl TcpIngress {
    pub fn new(
        payments: PaymentServiceRef,
        parser: Arc<dyn FrameParser>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payments,
            parser,
            currency: currency.into(),
        }
    }

    /// Runs the accept loop until `shutdown` is cancelled. Each connection is
    /// served on its own task.
    pub async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: CancellationToken) {
        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                },
            };
            let ingress = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = ingress.handle(stream).await {
                    tracing::warn!(%peer, error = %e, "connection failed");
                }
            });
        }
        tracing::info!("socket ingress stopped");
    }

    async fn handle(&self, mut stream: TcpStream) -> Result<()> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let n = stream.read(&mut buf).await?;

        let reply = match self.process(&buf[..n]).await {
            Ok(()) => REPLY_SUCCESS,
            Err(e) => {
                tracing::warn!(error = %e, "socket payment failed");
                REPLY_FAILURE
            }
        };
        stream.write_all(reply.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    async fn process(&self, frame: &[u8]) -> Result<()> {
        let payment = self.parser.parse(frame)?;
        let request = PaymentRequest::new(
            Action::Deposit,
            payment.user_id,
            self.currency.clone(),
            payment.amount,
        );
        let response = self.payments.deposit(request).await?;
        tracing::info!(
            transaction_id = response.transaction_id.as_deref().unwrap_or_default(),
            status = %response.status,
            "socket payment accepted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimited_frame() {
        let parser = DelimitedFrameParser;
        assert_eq!(
            parser.parse(b"u1|2500\n").unwrap(),
            FramePayment {
                user_id: "u1".to_string(),
                amount: 2500,
            }
        );
    }

    #[test]
    fn test_delimited_frame_rejects_garbage() {
        let parser = DelimitedFrameParser;
        assert!(parser.parse(b"u1 2500").unwrap_err().is_validation());
        assert!(parser.parse(b"u1|many").unwrap_err().is_validation());
        assert!(parser.parse(&[0xff, 0xfe, b'|', b'1']).unwrap_err().is_validation());
    }
}
