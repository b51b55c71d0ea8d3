use super::HttpTransport;
use crate::domain::payment::{Action, PaymentRequest, PaymentResponse};
use crate::domain::ports::PaymentGateway;
use crate::domain::routing::ProviderId;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

const CONTENT_TYPE_XML: &str = "text/xml";
const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const PGB_NS: &str = "http://pgsb.com/";

fn encoding_error(e: impl std::fmt::Display) -> PaymentError {
    PaymentError::Encoding(format!("PGB envelope: {e}"))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(encoding_error)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(encoding_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(encoding_error)?;
    Ok(())
}

/// Renders the SOAP envelope for a payment request.
///
/// Every value goes through the XML writer as a text node, so markup in user
/// supplied fields is escaped instead of becoming part of the document.
pub fn render_envelope(request: &PaymentRequest) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Start(BytesStart::new("soapenv:Envelope").with_attributes([
            ("xmlns:soapenv", SOAP_ENV_NS),
            ("xmlns:ws", PGB_NS),
        ])))
        .map_err(encoding_error)?;
    writer
        .write_event(Event::Empty(BytesStart::new("soapenv:Header")))
        .map_err(encoding_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("soapenv:Body")))
        .map_err(encoding_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("ws:PaymentRequest")))
        .map_err(encoding_error)?;

    write_text_element(&mut writer, "ws:TransactionID", request.transaction_id())?;
    write_text_element(&mut writer, "ws:UserID", &request.user_id)?;
    write_text_element(&mut writer, "ws:Currency", &request.currency)?;
    write_text_element(&mut writer, "ws:Amount", &request.amount.to_string())?;
    write_text_element(&mut writer, "ws:Exponent", &request.exponent.to_string())?;
    write_text_element(&mut writer, "ws:CountryCode", &request.country_code)?;

    for name in ["ws:PaymentRequest", "soapenv:Body", "soapenv:Envelope"] {
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(encoding_error)?;
    }

    String::from_utf8(writer.into_inner()).map_err(encoding_error)
}

#[derive(Clone, Copy)]
enum ReplyField {
    Status,
    Message,
}

#[derive(Debug, Default, PartialEq)]
struct SoapReply {
    status: String,
    message: String,
}

/// Extracts `{status, message}` from the action specific response element
/// (`depositResponse` / `withdrawResponse`). Namespace prefixes are ignored.
fn parse_reply(body: &[u8], action: Action) -> Result<SoapReply> {
    let malformed = |reason: String| {
        PaymentError::GatewayResponse(format!(
            "{reason}: {}",
            String::from_utf8_lossy(body)
        ))
    };

    let text = std::str::from_utf8(body).map_err(|e| malformed(e.to_string()))?;
    let expected = format!("{}Response", action.as_str());
    let mut reader = Reader::from_str(text);

    let mut found = false;
    let mut inside = false;
    let mut field: Option<ReplyField> = None;
    let mut reply = SoapReply::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("error parsing XML: {e}")))?;
        match event {
            Event::Start(e) => {
                let name = e.local_name();
                if name.as_ref() == expected.as_bytes() {
                    found = true;
                    inside = true;
                } else if inside {
                    field = match name.as_ref() {
                        b"status" => Some(ReplyField::Status),
                        b"message" => Some(ReplyField::Message),
                        _ => None,
                    };
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == expected.as_bytes() {
                    found = true;
                }
            }
            Event::Text(t) => {
                if let Some(target) = field {
                    let value = t
                        .unescape()
                        .map_err(|e| malformed(format!("error parsing XML: {e}")))?;
                    push_value(&mut reply, target, &value);
                }
            }
            Event::CData(c) => {
                if let Some(target) = field {
                    let raw = c.into_inner();
                    push_value(&mut reply, target, &String::from_utf8_lossy(&raw));
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == expected.as_bytes() {
                    inside = false;
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found {
        return Err(malformed(format!("no valid {action} response found")));
    }
    Ok(reply)
}

fn push_value(reply: &mut SoapReply, field: ReplyField, value: &str) {
    let slot = match field {
        ReplyField::Status => &mut reply.status,
        ReplyField::Message => &mut reply.message,
    };
    slot.push_str(value.trim());
}

/// Adapter for PGB, a SOAP service.
pub struct SoapGateway {
    transport: HttpTransport,
}

impl SoapGateway {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    async fn process(&self, request: &PaymentRequest, action: Action) -> Result<PaymentResponse> {
        let envelope = render_envelope(request)?;
        tracing::debug!(provider = "PGB", %action, request = %envelope, "sending request");

        let body = self.transport.post(action, CONTENT_TYPE_XML, envelope).await?;
        tracing::debug!(
            provider = "PGB",
            %action,
            response = %String::from_utf8_lossy(&body),
            "received response"
        );

        let reply = parse_reply(&body, action)?;
        Ok(PaymentResponse {
            status: reply.status,
            message: reply.message,
            transaction_id: request.transaction_id.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for SoapGateway {
    fn provider(&self) -> ProviderId {
        ProviderId::Pgb
    }

    async fn deposit(&self, request: &PaymentRequest) -> Result<PaymentResponse> {
        self.process(request, Action::Deposit).await
    }

    async fn withdraw(&self, request: &PaymentRequest) -> Result<PaymentResponse> {
        self.process(request, Action::Withdraw).await
    }
}
