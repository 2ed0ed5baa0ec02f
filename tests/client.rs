
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal_macros::dec;
use warp::Filter;
use warp::http::Response;

use szamlazz_rs::{
    Client, ClientOptions, CreditEntry, CreditEntryRequest, Credentials, Error,
    GetInvoiceDataRequest, ResponseVersion, ReverseInvoiceRequest,
};

/// Spawns a mock endpoint that captures each uploaded multipart body and
/// replies with the given response.
fn spawn_capturing<F>(reply: F) -> (SocketAddr, Arc<Mutex<String>>)
where
    F: Fn() -> Response<Vec<u8>> + Clone + Send + Sync + 'static,
{
    let captured = Arc::new(Mutex::new(String::new()));
    let cap = Arc::clone(&captured);
    let route = warp::post()
        .and(warp::body::bytes())
        .map(move |body: bytes::Bytes| {
            *cap.lock().unwrap() = String::from_utf8_lossy(&body).into_owned();
            reply()
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, captured)
}

fn success_headers() -> warp::http::response::Builder {
    Response::builder()
        .header("szlahu_szamlaszam", "E-TST-2020-1")
        .header("szlahu_nettovegosszeg", "200")
        .header("szlahu_bruttovegosszeg", "254")
        .header("szlahu_vevoifiokurl", "https://example.test/account")
}

#[test]
fn a_short_auth_token_is_rejected() {
    test_utils::do_setup();
    let options = ClientOptions::new(Credentials::AuthToken(" a ".to_string()));
    assert!(matches!(
        Client::new(options).unwrap_err(),
        Error::Validation(_)
    ));
}

#[test]
fn user_password_credentials_are_validated() {
    test_utils::do_setup();
    let options = ClientOptions::new(Credentials::UserPassword {
        user: "someone@example.test".to_string(),
        password: String::new(),
    });
    let err = Client::new(options).unwrap_err();
    match err {
        Error::Validation(message) => assert!(message.contains("password"), "{message}"),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn a_non_200_status_maps_to_a_transport_error() {
    test_utils::do_setup();
    let route =
        warp::post().map(|| Response::builder().status(404).body(Vec::new()).unwrap());
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let client = test_utils::client_for(addr);
    let err = client
        .issue_invoice(&test_utils::sample_invoice())
        .await
        .unwrap_err();
    match err {
        Error::Transport {
            status,
            ref status_text,
        } => {
            assert_eq!(status, 404);
            assert_eq!(status_text, "Not Found");
        }
        ref other => panic!("expected a transport error, got {other:?}"),
    }
    assert_eq!(err.to_string(), "404 Not Found");
}

#[tokio::test]
async fn an_expired_timeout_surfaces_as_a_request_error() {
    test_utils::do_setup();
    let route = warp::post().and_then(|| async {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok::<_, warp::Rejection>(warp::reply())
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let mut options = test_utils::options_for(addr);
    options.timeout = Some(std::time::Duration::from_millis(50));
    let client = Client::new(options).unwrap();

    let err = client
        .issue_invoice(&test_utils::sample_invoice())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Request(_)), "{err:?}");
}

#[tokio::test]
async fn service_errors_arrive_url_encoded_in_headers() {
    test_utils::do_setup();
    let route = warp::post().map(|| {
        Response::builder()
            .header("szlahu_error_code", "57")
            .header("szlahu_error", "Hib%C3%A1s+vev%C5%91i+adatok")
            .body(Vec::new())
            .unwrap()
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let client = test_utils::client_for(addr);
    let err = client
        .issue_invoice(&test_utils::sample_invoice())
        .await
        .unwrap_err();
    assert_eq!(err.service_code(), Some("57"));
    match err {
        Error::Service { code, message } => {
            assert_eq!(code, "57");
            assert_eq!(message, "Hibás vevői adatok");
        }
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[tokio::test]
async fn issue_invoice_returns_totals_and_the_pdf_body() {
    test_utils::do_setup();
    let (addr, captured) = spawn_capturing(|| {
        success_headers()
            .body(b"%PDF-1.4 test".to_vec())
            .unwrap()
    });

    let mut options = test_utils::options_for(addr);
    options.request_invoice_download = true;
    let client = Client::new(options).unwrap();

    let issued = client
        .issue_invoice(&test_utils::sample_invoice())
        .await
        .unwrap();
    assert_eq!(issued.invoice_id, "E-TST-2020-1");
    assert_eq!(issued.net_total, "200");
    assert_eq!(issued.gross_total, "254");
    assert_eq!(
        issued.customer_account_url.as_deref(),
        Some("https://example.test/account")
    );
    assert_eq!(issued.pdf.as_deref(), Some(&b"%PDF-1.4 test"[..]));

    let body = captured.lock().unwrap().clone();
    assert!(body.contains("name=\"action-xmlagentxmlfile\""), "{body}");
    assert!(body.contains("filename=\"request.xml\""), "{body}");
    assert!(body.contains("<xmlszamla xmlns=\"http://www.szamlazz.hu/xmlszamla\""));
    assert!(body.contains("<szamlaagentkulcs>agent-key-123</szamlaagentkulcs>"));
    assert!(body.contains("<szamlaLetoltes>true</szamlaLetoltes>"));
    assert!(body.contains("<valaszVerzio>1</valaszVerzio>"));
}

#[tokio::test]
async fn issue_invoice_decodes_the_pdf_from_the_response_envelope() {
    test_utils::do_setup();
    let encoded = BASE64.encode(b"%PDF-1.4 test");
    let body = format!(
        "<xmlszamlavalasz><sikeres>true</sikeres><pdf>{encoded}</pdf></xmlszamlavalasz>"
    );
    let route = warp::post().map(move || success_headers().body(body.clone()).unwrap());
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let mut options = test_utils::options_for(addr);
    options.request_invoice_download = true;
    options.response_version = ResponseVersion::PdfInXml;
    let client = Client::new(options).unwrap();

    let issued = client
        .issue_invoice(&test_utils::sample_invoice())
        .await
        .unwrap();
    assert_eq!(issued.invoice_id, "E-TST-2020-1");
    assert_eq!(issued.pdf.as_deref(), Some(&b"%PDF-1.4 test"[..]));
}

#[tokio::test]
async fn errors_embedded_in_the_response_document_are_detected() {
    test_utils::do_setup();
    let route = warp::post().map(|| {
        Response::builder()
            .body(
                "<xmlszamlavalasz><sikeres>false</sikeres>\
                 <hibakod>3</hibakod>\
                 <hibauzenet>Sikertelen bejelentkezés.</hibauzenet>\
                 </xmlszamlavalasz>"
                    .to_string(),
            )
            .unwrap()
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let mut options = test_utils::options_for(addr);
    options.response_version = ResponseVersion::PdfInXml;
    let client = Client::new(options).unwrap();

    let err = client
        .issue_invoice(&test_utils::sample_invoice())
        .await
        .unwrap_err();
    match err {
        Error::Service { code, message } => {
            assert_eq!(code, "3");
            assert_eq!(message, "Sikertelen bejelentkezés.");
        }
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[tokio::test]
async fn reverse_invoice_posts_the_storno_action() {
    test_utils::do_setup();
    let (addr, captured) = spawn_capturing(|| {
        Response::builder()
            .header("szlahu_szamlaszam", "E-TST-2020-2")
            .header("szlahu_nettovegosszeg", "-200")
            .header("szlahu_bruttovegosszeg", "-254")
            .body(b"%PDF-1.4 storno".to_vec())
            .unwrap()
    });

    let client = test_utils::client_for(addr);
    let reversed = client
        .reverse_invoice(&ReverseInvoiceRequest {
            invoice_id: "E-TST-2020-1".to_string(),
            e_invoice: false,
            request_invoice_download: true,
        })
        .await
        .unwrap();
    assert_eq!(reversed.invoice_id, "E-TST-2020-2");
    assert_eq!(reversed.net_total, "-200");
    assert_eq!(reversed.pdf.as_deref(), Some(&b"%PDF-1.4 storno"[..]));

    let body = captured.lock().unwrap().clone();
    assert!(body.contains("name=\"action-szamla_agent_st\""), "{body}");
    assert!(body.contains("<xmlszamlast xmlns=\"http://www.szamlazz.hu/xmlszamlast\""));
    assert!(body.contains("<szamlaszam>E-TST-2020-1</szamlaszam>"));
    assert!(body.contains("<keltDatum>"));
}

#[tokio::test]
async fn reverse_invoice_requires_an_invoice_id() {
    test_utils::do_setup();
    let client = test_utils::client_for("127.0.0.1:9".parse().unwrap());
    let err = client
        .reverse_invoice(&ReverseInvoiceRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn get_invoice_data_returns_the_parsed_document() {
    test_utils::do_setup();
    let (addr, captured) = spawn_capturing(|| {
        Response::builder()
            .body(
                "<szamla><alap><szamlaszam>E-TST-2020-1</szamlaszam>\
                 <fizmod>átutalás</fizmod></alap>\
                 <osszegek><totalossz><netto>200</netto><brutto>254</brutto>\
                 </totalossz></osszegek></szamla>"
                    .as_bytes()
                    .to_vec(),
            )
            .unwrap()
    });

    let client = test_utils::client_for(addr);
    let invoice = client
        .get_invoice_data(&GetInvoiceDataRequest {
            invoice_id: Some("E-TST-2020-1".to_string()),
            order_number: None,
            pdf: None,
        })
        .await
        .unwrap();
    assert_eq!(
        invoice.descendant(&["alap", "szamlaszam"]).unwrap().text,
        "E-TST-2020-1"
    );
    assert_eq!(
        invoice
            .descendant(&["osszegek", "totalossz", "brutto"])
            .unwrap()
            .text,
        "254"
    );

    let body = captured.lock().unwrap().clone();
    assert!(body.contains("name=\"action-szamla_agent_xml\""), "{body}");
    assert!(body.contains("<szamlaszam>E-TST-2020-1</szamlaszam>"));
    assert!(!body.contains("<pdf>"));
    assert!(!body.contains("rendelesSzam"));

    // Asking for the PDF renders the flag.
    client
        .get_invoice_data(&GetInvoiceDataRequest {
            invoice_id: Some("E-TST-2020-1".to_string()),
            order_number: None,
            pdf: Some(true),
        })
        .await
        .unwrap();
    let body = captured.lock().unwrap().clone();
    assert!(body.contains("<pdf>true</pdf>"), "{body}");
}

#[tokio::test]
async fn get_invoice_data_requires_an_identifier() {
    test_utils::do_setup();
    let client = test_utils::client_for("127.0.0.1:9".parse().unwrap());
    let err = client
        .get_invoice_data(&GetInvoiceDataRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn get_invoice_data_rejects_a_foreign_document() {
    test_utils::do_setup();
    let route = warp::post().map(|| {
        Response::builder()
            .body("<valami>nem szamla</valami>".to_string())
            .unwrap()
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let client = test_utils::client_for(addr);
    let err = client
        .get_invoice_data(&GetInvoiceDataRequest {
            invoice_id: Some("E-TST-2020-1".to_string()),
            ..GetInvoiceDataRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn query_taxpayer_builds_the_full_profile() {
    test_utils::do_setup();
    let (addr, captured) = spawn_capturing(|| {
        Response::builder()
            .body(
                "<ns:QueryTaxpayerResponse xmlns:ns=\"http://schemas.nav.gov.hu/OSA/1.0/api\">\
                 <ns:taxpayerValidity>true</ns:taxpayerValidity>\
                 <ns:taxpayerData>\
                 <ns:taxpayerName>PÉLDA KFT</ns:taxpayerName>\
                 <ns:taxpayerShortName>PÉLDA</ns:taxpayerShortName>\
                 <ns:taxNumberDetail>\
                 <ns:taxpayerId>12345678</ns:taxpayerId>\
                 <ns:vatCode>2</ns:vatCode>\
                 <ns:countyCode>41</ns:countyCode>\
                 </ns:taxNumberDetail>\
                 <ns:taxpayerAddressList><ns:taxpayerAddressItem>\
                 <ns:taxpayerAddressType>HQ</ns:taxpayerAddressType>\
                 <ns:taxpayerAddress>\
                 <ns:countryCode>HU</ns:countryCode>\
                 <ns:postalCode>1031</ns:postalCode>\
                 <ns:city>BUDAPEST</ns:city>\
                 <ns:streetName>ZÁHONY</ns:streetName>\
                 <ns:publicPlaceCategory>UTCA</ns:publicPlaceCategory>\
                 <ns:number>7</ns:number>\
                 </ns:taxpayerAddress>\
                 </ns:taxpayerAddressItem></ns:taxpayerAddressList>\
                 </ns:taxpayerData>\
                 </ns:QueryTaxpayerResponse>"
                    .as_bytes()
                    .to_vec(),
            )
            .unwrap()
    });

    let client = test_utils::client_for(addr);
    let taxpayer = client.query_taxpayer("12345678").await.unwrap().unwrap();
    assert_eq!(taxpayer.id, "12345678");
    assert_eq!(taxpayer.vat_code, "2");
    assert_eq!(taxpayer.county_code, "41");
    assert_eq!(taxpayer.name, "PÉLDA KFT");
    assert_eq!(taxpayer.short_name, "PÉLDA");
    assert_eq!(taxpayer.address.country_code, "HU");
    assert_eq!(taxpayer.address.postal_code, "1031");
    assert_eq!(taxpayer.address.city, "BUDAPEST");
    assert_eq!(taxpayer.address.street_name, "ZÁHONY");
    assert_eq!(taxpayer.address.public_place_category, "UTCA");
    assert_eq!(taxpayer.address.number, "7");

    let body = captured.lock().unwrap().clone();
    assert!(
        body.contains("name=\"action-szamla_agent_taxpayer\""),
        "{body}"
    );
    assert!(body.contains("<torzsszam>12345678</torzsszam>"));
}

#[tokio::test]
async fn query_taxpayer_reports_invalid_ids_as_none() {
    test_utils::do_setup();
    let route = warp::post().map(|| {
        Response::builder()
            .body(
                "<QueryTaxpayerResponse>\
                 <taxpayerValidity>false</taxpayerValidity>\
                 </QueryTaxpayerResponse>"
                    .to_string(),
            )
            .unwrap()
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let client = test_utils::client_for(addr);
    assert!(client.query_taxpayer("00000000").await.unwrap().is_none());
}

#[tokio::test]
async fn register_credit_entry_returns_the_settlement_totals() {
    test_utils::do_setup();
    let (addr, captured) = spawn_capturing(|| {
        success_headers().body(Vec::new()).unwrap()
    });

    let client = test_utils::client_for(addr);
    let mut entry = CreditEntry::new(dec!(254));
    entry.description = "bank transfer".to_string();

    let summary = client
        .register_credit_entry(
            &CreditEntryRequest {
                invoice_id: "E-TST-2020-1".to_string(),
                additive: true,
                tax_number: None,
            },
            &[entry],
        )
        .await
        .unwrap();
    assert_eq!(summary.invoice_id, "E-TST-2020-1");
    assert_eq!(summary.net_total, "200");
    assert_eq!(summary.gross_total, "254");

    let body = captured.lock().unwrap().clone();
    assert!(body.contains("name=\"action-szamla_agent_kifiz\""), "{body}");
    assert!(body.contains("<additiv>true</additiv>"));
    assert!(body.contains("<jogcim>átutalás</jogcim>"));
    assert!(body.contains("<osszeg>254</osszeg>"));
    assert!(body.contains("<leiras>bank transfer</leiras>"));
    assert!(!body.contains("adoszam"));
}

#[tokio::test]
async fn register_credit_entry_requires_entries() {
    test_utils::do_setup();
    let client = test_utils::client_for("127.0.0.1:9".parse().unwrap());
    let err = client
        .register_credit_entry(
            &CreditEntryRequest {
                invoice_id: "E-TST-2020-1".to_string(),
                additive: false,
                tax_number: None,
            },
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn register_credit_entry_rejects_a_zero_amount_entry() {
    test_utils::do_setup();
    let client = test_utils::client_for("127.0.0.1:9".parse().unwrap());
    let err = client
        .register_credit_entry(
            &CreditEntryRequest {
                invoice_id: "E-TST-2020-1".to_string(),
                additive: false,
                tax_number: None,
            },
            &[CreditEntry::new(dec!(0))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn the_session_cookie_sticks_to_one_client() {
    test_utils::do_setup();
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let route = warp::post()
        .and(warp::header::optional::<String>("cookie"))
        .map(move |cookie: Option<String>| {
            log.lock().unwrap().push(cookie);
            success_headers()
                .header("set-cookie", "JSESSIONID=abc123; Path=/")
                .body(b"%PDF-1.4 test".to_vec())
                .unwrap()
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let invoice = test_utils::sample_invoice();
    let client = test_utils::client_for(addr);
    client.issue_invoice(&invoice).await.unwrap();
    client.issue_invoice(&invoice).await.unwrap();

    let fresh = test_utils::client_for(addr);
    fresh.issue_invoice(&invoice).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_none());
    assert!(
        seen[1]
            .as_deref()
            .is_some_and(|c| c.contains("JSESSIONID=abc123")),
        "{:?}",
        seen[1]
    );
    assert!(seen[2].is_none(), "{:?}", seen[2]);
}
