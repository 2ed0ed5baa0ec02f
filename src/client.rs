//! The Számla Agent protocol client.
//!
//! Every public operation performs exactly one network exchange:
//! build the action's XML document, wrap it as a multipart file upload,
//! POST it, classify the outcome, then extract the typed result. Failed
//! calls surface immediately; nothing is retried.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use percent_encoding::percent_decode_str;
use reqwest::{StatusCode, header::HeaderMap, multipart};
use url::Url;

use crate::entities::{CreditEntry, Invoice};
use crate::error::{Error, Result};
use crate::xml::{self, Field, Node, Value, field, opt};

/// The single endpoint all actions are posted to.
pub const DEFAULT_ENDPOINT: &str = "https://www.szamlazz.hu/szamla/";

/// How the service credentials are presented inside each document.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A Számla Agent key.
    AuthToken(String),
    /// Account username and password.
    UserPassword { user: String, password: String },
}

/// Selects how a requested PDF arrives in the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseVersion {
    /// Protocol version 1: the response body is the raw PDF.
    #[default]
    PdfInBody,
    /// Protocol version 2: the response is an XML envelope carrying the
    /// PDF as a base64 field.
    PdfInXml,
}

impl ResponseVersion {
    fn wire_value(self) -> i64 {
        match self {
            Self::PdfInBody => 1,
            Self::PdfInXml => 2,
        }
    }
}

/// Client configuration, assembled once at construction.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub credentials: Credentials,
    /// Issue electronic invoices. Default: false.
    pub e_invoice: bool,
    /// Ask the service to return the generated PDF. Default: false.
    pub request_invoice_download: bool,
    /// Number of copies in the downloaded PDF. Default: 1.
    pub downloaded_invoice_count: u32,
    /// PDF delivery protocol. Default: [`ResponseVersion::PdfInBody`].
    pub response_version: ResponseVersion,
    /// Per-call timeout forwarded to the transport; expiry surfaces as a
    /// request error. Default: none.
    pub timeout: Option<Duration>,
    /// Service endpoint, overridable for testing.
    pub base_url: Url,
}

impl ClientOptions {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            e_invoice: false,
            request_invoice_download: false,
            downloaded_invoice_count: 1,
            response_version: ResponseVersion::default(),
            timeout: None,
            base_url: Url::parse(DEFAULT_ENDPOINT).unwrap(),
        }
    }
}

/// Summary of an issued or reversed invoice, extracted from the response
/// headers. Totals arrive as the service's decimal strings.
#[derive(Debug, Clone)]
pub struct IssuedInvoice {
    pub invoice_id: String,
    pub net_total: String,
    pub gross_total: String,
    pub customer_account_url: Option<String>,
    /// The generated PDF, when a download was requested.
    pub pdf: Option<Vec<u8>>,
}

/// Settlement totals returned after registering credit entries.
#[derive(Debug, Clone)]
pub struct PaymentSummary {
    pub invoice_id: String,
    pub net_total: String,
    pub gross_total: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReverseInvoiceRequest {
    pub invoice_id: String,
    pub e_invoice: bool,
    pub request_invoice_download: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GetInvoiceDataRequest {
    pub invoice_id: Option<String>,
    pub order_number: Option<String>,
    /// Ask for the PDF alongside the data; `None` leaves the field out.
    pub pdf: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CreditEntryRequest {
    pub invoice_id: String,
    /// Whether the entries add to previously registered payments.
    pub additive: bool,
    pub tax_number: Option<String>,
}

/// A taxpayer profile returned by the NAV taxpayer query.
#[derive(Debug, Clone)]
pub struct Taxpayer {
    pub id: String,
    pub vat_code: String,
    pub county_code: String,
    pub name: String,
    pub short_name: String,
    pub address: TaxpayerAddress,
}

#[derive(Debug, Clone)]
pub struct TaxpayerAddress {
    pub country_code: String,
    pub postal_code: String,
    pub city: String,
    pub street_name: String,
    pub public_place_category: String,
    pub number: String,
}

/// A classified, successful service response.
struct ServiceResponse {
    headers: HeaderMap,
    body: Vec<u8>,
    /// Parsed document, present unless the call expected a binary body.
    document: Option<Node>,
}

impl ServiceResponse {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn document(&self) -> Result<&Node> {
        self.document
            .as_ref()
            .ok_or_else(|| Error::unexpected("expected an XML response body"))
    }
}

fn nontrivial(value: &str) -> bool {
    value.trim().len() > 1
}

/// The service URL-encodes its error messages with `+` for spaces.
fn decode_error_message(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

fn require_text(node: &Node, name: &str) -> Result<String> {
    node.text_of(name)
        .map(str::to_string)
        .ok_or_else(|| Error::unexpected(format!("missing `{name}` field in response")))
}

/// A client for the szamlazz.hu Számla Agent API.
///
/// Each client owns its own cookie store: the service pins a session via a
/// cookie after the first exchange, so subsequent calls on the same
/// instance stay authenticated, and separate instances never share session
/// state. Calls on one instance are expected to run sequentially.
#[derive(Debug)]
pub struct Client {
    options: ClientOptions,
    http: reqwest::Client,
}

impl Client {
    /// Validates the credentials for the chosen authentication mode and
    /// builds the session-scoped HTTP client.
    pub fn new(options: ClientOptions) -> Result<Self> {
        match &options.credentials {
            Credentials::AuthToken(token) => {
                if !nontrivial(token) {
                    return Err(Error::validation(
                        "valid auth token field missing from client options",
                    ));
                }
            }
            Credentials::UserPassword { user, password } => {
                if !nontrivial(user) {
                    return Err(Error::validation(
                        "valid user field missing from client options",
                    ));
                }
                if !nontrivial(password) {
                    return Err(Error::validation(
                        "valid password field missing from client options",
                    ));
                }
            }
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(Error::Request)?;

        Ok(Self { options, http })
    }

    pub fn set_request_invoice_download(&mut self, value: bool) {
        self.options.request_invoice_download = value;
    }

    fn xml_header(tag: &str, dir: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <{tag} xmlns=\"http://www.szamlazz.hu/{tag}\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             xsi:schemaLocation=\"http://www.szamlazz.hu/{tag} \
             https://www.szamlazz.hu/szamla/docs/xsds/{dir}/{tag}.xsd\">\n"
        )
    }

    fn auth_fields(&self) -> Vec<Field> {
        match &self.options.credentials {
            Credentials::AuthToken(token) => vec![field("szamlaagentkulcs", token.as_str())],
            Credentials::UserPassword { user, password } => vec![
                field("felhasznalo", user.as_str()),
                field("jelszo", password.as_str()),
            ],
        }
    }

    /// BUILD → SEND → CLASSIFY → (PARSE | RETURN-RAW).
    #[instrument(skip(self, document))]
    async fn send_request(
        &self,
        action: &'static str,
        document: String,
        binary_download: bool,
    ) -> Result<ServiceResponse> {
        trace!(%document, "sending request");

        let form = multipart::Form::new().part(
            action,
            multipart::Part::text(document).file_name("request.xml"),
        );

        let mut request = self
            .http
            .post(self.options.base_url.clone())
            .multipart(form);
        if let Some(timeout) = self.options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "received response");

        if status != StatusCode::OK {
            return Err(Error::Transport {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        if let Some(code) = response
            .headers()
            .get("szlahu_error_code")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
        {
            let raw = response
                .headers()
                .get("szlahu_error")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let message = decode_error_message(raw);
            warn!(%code, %message, "service reported an error");
            return Err(Error::Service { code, message });
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        if binary_download {
            return Ok(ServiceResponse {
                headers,
                body,
                document: None,
            });
        }

        let text = String::from_utf8_lossy(&body);
        let parsed = xml::parse(&text)?;

        // Text-mode errors arrive embedded in the response document rather
        // than in the header pair.
        if parsed.name == "xmlszamlavalasz"
            && let Some(code) = parsed.text_of("hibakod")
        {
            let code = code.to_string();
            let message = parsed.text_of("hibauzenet").unwrap_or_default().to_string();
            warn!(%code, %message, "service reported an error");
            return Err(Error::Service { code, message });
        }

        Ok(ServiceResponse {
            headers,
            body,
            document: Some(parsed),
        })
    }

    fn invoice_summary(response: &ServiceResponse) -> IssuedInvoice {
        IssuedInvoice {
            invoice_id: response.header("szlahu_szamlaszam").unwrap_or_default(),
            net_total: response.header("szlahu_nettovegosszeg").unwrap_or_default(),
            gross_total: response
                .header("szlahu_bruttovegosszeg")
                .unwrap_or_default(),
            customer_account_url: response.header("szlahu_vevoifiokurl"),
            pdf: None,
        }
    }

    /// Issues the invoice and returns its service-assigned number and
    /// totals, plus the PDF when a download was requested.
    #[instrument(skip(self, invoice))]
    pub async fn issue_invoice(&self, invoice: &Invoice) -> Result<IssuedInvoice> {
        let mut settings = self.auth_fields();
        settings.push(field("eszamla", self.options.e_invoice));
        settings.push(field("szamlaLetoltes", self.options.request_invoice_download));
        settings.push(field(
            "szamlaLetoltesPld",
            self.options.downloaded_invoice_count,
        ));
        settings.push(field(
            "valaszVerzio",
            self.options.response_version.wire_value(),
        ));

        let mut document = Self::xml_header("xmlszamla", "agent");
        document.push_str(&xml::render_element(
            "beallitasok",
            &Value::Elements(settings),
            1,
        ));
        document.push_str(&invoice.generate_xml(1)?);
        document.push_str("</xmlszamla>");

        let binary = self.options.response_version == ResponseVersion::PdfInBody;
        let response = self
            .send_request("action-xmlagentxmlfile", document, binary)
            .await?;

        let mut result = Self::invoice_summary(&response);

        if self.options.request_invoice_download {
            result.pdf = Some(match self.options.response_version {
                ResponseVersion::PdfInBody => response.body.clone(),
                ResponseVersion::PdfInXml => {
                    let parsed = response.document()?;
                    if parsed.name != "xmlszamlavalasz" {
                        return Err(Error::unexpected(format!(
                            "expected `xmlszamlavalasz` response, got `{}`",
                            parsed.name
                        )));
                    }
                    let encoded = require_text(parsed, "pdf")?;
                    BASE64.decode(encoded.trim()).map_err(|e| {
                        Error::unexpected(format!("pdf field is not valid base64: {e}"))
                    })?
                }
            });
        }

        info!(invoice_id = %result.invoice_id, "invoice issued");
        Ok(result)
    }

    /// Reverses (storno) a previously issued invoice.
    #[instrument(skip(self))]
    pub async fn reverse_invoice(
        &self,
        request: &ReverseInvoiceRequest,
    ) -> Result<IssuedInvoice> {
        if !nontrivial(&request.invoice_id) {
            return Err(Error::validation("invoice id must be specified"));
        }

        let mut settings = self.auth_fields();
        settings.push(field("eszamla", request.e_invoice));
        settings.push(field("szamlaLetoltes", request.request_invoice_download));

        let header = vec![
            field("szamlaszam", request.invoice_id.as_str()),
            field("keltDatum", time::OffsetDateTime::now_utc().date()),
        ];

        let mut document = Self::xml_header("xmlszamlast", "agentst");
        document.push_str(&xml::render_element(
            "beallitasok",
            &Value::Elements(settings),
            1,
        ));
        document.push_str(&xml::render_element("fejlec", &Value::Elements(header), 1));
        document.push_str("</xmlszamlast>");

        let response = self
            .send_request("action-szamla_agent_st", document, true)
            .await?;

        let mut result = Self::invoice_summary(&response);
        if request.request_invoice_download {
            result.pdf = Some(response.body.clone());
        }

        info!(invoice_id = %result.invoice_id, "invoice reversed");
        Ok(result)
    }

    /// Fetches the summary data of an existing invoice, addressed by
    /// invoice number or order number. Returns the parsed `szamla` node.
    #[instrument(skip(self))]
    pub async fn get_invoice_data(&self, request: &GetInvoiceDataRequest) -> Result<Node> {
        let has_invoice_id = request.invoice_id.as_deref().is_some_and(nontrivial);
        let has_order_number = request.order_number.as_deref().is_some_and(nontrivial);
        if !has_invoice_id && !has_order_number {
            return Err(Error::validation(
                "either invoice id or order number must be specified",
            ));
        }

        let mut fields = self.auth_fields();
        fields.push(opt("szamlaszam", request.invoice_id.as_deref()));
        fields.push(opt("rendelesSzam", request.order_number.as_deref()));
        fields.push(opt("pdf", request.pdf));

        let mut document = Self::xml_header("xmlszamlaxml", "agentxml");
        document.push_str(&xml::render_fields(&fields, 0));
        document.push_str("</xmlszamlaxml>");

        let response = self
            .send_request("action-szamla_agent_xml", document, false)
            .await?;

        let parsed = response.document()?;
        if parsed.name != "szamla" {
            return Err(Error::unexpected(format!(
                "expected `szamla` response, got `{}`",
                parsed.name
            )));
        }
        Ok(parsed.clone())
    }

    /// Looks up a Hungarian taxpayer by its tax id. Returns `None` when the
    /// service reports the id as invalid.
    #[instrument(skip(self))]
    pub async fn query_taxpayer(&self, tax_id: &str) -> Result<Option<Taxpayer>> {
        let settings = self.auth_fields();

        let mut document = Self::xml_header("xmltaxpayer", "agent");
        document.push_str(&xml::render_element(
            "beallitasok",
            &Value::Elements(settings),
            1,
        ));
        document.push_str(&xml::render_element("torzsszam", &tax_id.into(), 1));
        document.push_str("</xmltaxpayer>");

        let response = self
            .send_request("action-szamla_agent_taxpayer", document, false)
            .await?;

        let parsed = response.document()?;
        if parsed.text_of("taxpayerValidity") != Some("true") {
            debug!(tax_id, "taxpayer reported invalid");
            return Ok(None);
        }

        let data = parsed
            .child("taxpayerData")
            .ok_or_else(|| Error::unexpected("missing `taxpayerData` node in response"))?;
        let detail = data
            .child("taxNumberDetail")
            .ok_or_else(|| Error::unexpected("missing `taxNumberDetail` node in response"))?;
        let address = data
            .descendant(&["taxpayerAddressList", "taxpayerAddressItem", "taxpayerAddress"])
            .ok_or_else(|| Error::unexpected("missing `taxpayerAddress` node in response"))?;

        Ok(Some(Taxpayer {
            id: require_text(detail, "taxpayerId")?,
            vat_code: require_text(detail, "vatCode")?,
            county_code: require_text(detail, "countyCode")?,
            name: require_text(data, "taxpayerName")?,
            short_name: require_text(data, "taxpayerShortName")?,
            address: TaxpayerAddress {
                country_code: require_text(address, "countryCode")?,
                postal_code: require_text(address, "postalCode")?,
                city: require_text(address, "city")?,
                street_name: require_text(address, "streetName")?,
                public_place_category: require_text(address, "publicPlaceCategory")?,
                number: require_text(address, "number")?,
            },
        }))
    }

    /// Registers one or more credit entries against an issued invoice and
    /// returns the settlement totals.
    #[instrument(skip(self, entries))]
    pub async fn register_credit_entry(
        &self,
        request: &CreditEntryRequest,
        entries: &[CreditEntry],
    ) -> Result<PaymentSummary> {
        if !nontrivial(&request.invoice_id) {
            return Err(Error::validation("invoice id must be specified"));
        }
        if entries.is_empty() {
            return Err(Error::validation(
                "at least one credit entry must be specified",
            ));
        }

        let mut settings = self.auth_fields();
        settings.push(field("szamlaszam", request.invoice_id.as_str()));
        settings.push(opt("adoszam", request.tax_number.as_deref()));
        settings.push(field("additiv", request.additive));

        let mut document = Self::xml_header("xmlszamlakifiz", "agentkifiz");
        document.push_str(&xml::render_element(
            "beallitasok",
            &Value::Elements(settings),
            1,
        ));
        for entry in entries {
            document.push_str(&entry.generate_xml(1)?);
        }
        document.push_str("</xmlszamlakifiz>");

        let response = self
            .send_request("action-szamla_agent_kifiz", document, true)
            .await?;

        Ok(PaymentSummary {
            invoice_id: response.header("szlahu_szamlaszam").unwrap_or_default(),
            net_total: response.header("szlahu_nettovegosszeg").unwrap_or_default(),
            gross_total: response
                .header("szlahu_bruttovegosszeg")
                .unwrap_or_default(),
        })
    }
}
