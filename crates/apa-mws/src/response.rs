//! # MWS Response Parsing
//!
//! MWS answers every action with XML. Failures carry an `Error` element:
//!
//! ```xml
//! <ErrorResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
//!   <Error>
//!     <Type>Sender</Type>
//!     <Code>InvalidOrderReferenceId</Code>
//!     <Message>The OrderReferenceId S00-0000000-0000000 is invalid.</Message>
//!   </Error>
//!   <RequestId>...</RequestId>
//! </ErrorResponse>
//! ```

use apa_core::ApiErrorBody;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Errors raised while reading an MWS XML body
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// Text content could not be decoded.
    #[error("failed to decode text: {0}")]
    Decode(String),
}

/// Extract `Error/Code` and `Error/Message` from an MWS response body.
///
/// Returns `Ok(None)` when the body has no `Error` element with a code.
pub fn parse_error_response(body: &str) -> Result<Option<ApiErrorBody>, XmlError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut code = String::new();
    let mut message = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|err| XmlError::Decode(err.to_string()))?;
                if let [.., parent, leaf] = path.as_slice() {
                    if parent == "Error" {
                        match leaf.as_str() {
                            "Code" => code.push_str(&text),
                            "Message" => message.push_str(&text),
                            _ => {}
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let code = code.trim();
    if code.is_empty() {
        return Ok(None);
    }

    Ok(Some(ApiErrorBody {
        code: code.to_string(),
        message: message.trim().to_string(),
    }))
}
