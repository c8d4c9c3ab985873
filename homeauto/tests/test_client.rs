//! Gateway client tests against a mock HTTP server

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homeauto::http::client::{GatewayApi, GatewayClient};

const SID: &str = "a1b2c3d4e5f60718";

fn session_doc(sid: &str, challenge: &str, block_time: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><SessionInfo><SID>{}</SID><Challenge>{}</Challenge><BlockTime>{}</BlockTime><Rights></Rights></SessionInfo>"#,
        sid, challenge, block_time
    )
}

async fn mock_switchcmd(server: &MockServer, cmd: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/webservices/homeautoswitch.lua"))
        .and(query_param("sid", SID))
        .and(query_param("switchcmd", cmd))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_answers_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param("username", "admin"))
        .and(query_param("response", "1234567z-9e224a41eeefa284df7bb0f26c2913e2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_doc(SID, "1234567z", 0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param("username", "admin"))
        .and(query_param_is_missing("response"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(session_doc("0000000000000000", "1234567z", 0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    assert_eq!(client.authenticate("admin", "äbc").await.unwrap(), SID);
}

#[tokio::test]
async fn test_login_reuses_open_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param_is_missing("response"))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_doc(SID, "1234567z", 0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(&format!("{}/", server.uri())).unwrap();
    assert_eq!(client.login("admin", "secret").await.unwrap(), SID);
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(session_doc("0000000000000000", "4f2a9c1b", 10)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    let err = client.login("admin", "wrong").await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_login_without_password_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    assert!(client.login("admin", "").await.is_err());
}

#[tokio::test]
async fn test_list_devices() {
    let server = MockServer::start().await;
    mock_switchcmd(
        &server,
        "getdevicelistinfos",
        r#"<devicelist version="1">
<device identifier="08761 0000434" id="17" functionbitmask="35712" fwversion="04.25" manufacturer="AVM" productname="FRITZ!DECT 200">
<present>1</present><name>Kitchen</name>
<switch><state>1</state></switch><powermeter><power>2500</power><energy>10</energy></powermeter>
</device>
<device identifier="11630 0000001" id="21" functionbitmask="1048864" fwversion="05.10" manufacturer="AVM" productname="FRITZ!DECT 440">
<present>1</present><name>Bath</name>
<temperature><celsius>215</celsius><offset>0</offset></temperature><humidity><rel_humidity>47</rel_humidity></humidity>
</device>
</devicelist>"#,
    )
    .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    let devices = client.list_devices(SID).await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].identifier, "08761 0000434");
    assert!(devices[0].switch.is_some());
    assert!(devices[1].humidity.is_some());
}

#[tokio::test]
async fn test_switch_power_encodes_ain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webservices/homeautoswitch.lua"))
        .and(query_param("switchcmd", "getswitchpower"))
        .and(query_param("ain", "08761 0000434"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2500\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    assert_eq!(client.get_switch_power(SID, "08761 0000434").await.unwrap(), 2500);
}

#[tokio::test]
async fn test_switch_commands() {
    let server = MockServer::start().await;
    mock_switchcmd(&server, "getswitchstate", "1\n").await;
    mock_switchcmd(&server, "setswitchtoggle", "0\n").await;
    mock_switchcmd(&server, "gettemperature", "-15\n").await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    assert!(client.get_switch_state(SID, "1").await.unwrap());
    assert!(!client.set_switch_toggle(SID, "1").await.unwrap());
    assert_eq!(client.get_temperature(SID, "1").await.unwrap(), -15);
}

#[tokio::test]
async fn test_humidity_from_device_infos() {
    let server = MockServer::start().await;
    mock_switchcmd(
        &server,
        "getdeviceinfos",
        r#"<device identifier="11630 0000001" id="21" productname="FRITZ!DECT 440"><present>1</present><name>Bath</name><humidity><rel_humidity>47</rel_humidity></humidity></device>"#,
    )
    .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    assert_eq!(client.get_humidity(SID, "11630 0000001").await.unwrap(), 47);
}

#[tokio::test]
async fn test_bad_replies_are_query_errors() {
    let server = MockServer::start().await;
    mock_switchcmd(&server, "gettemperature", "").await;
    mock_switchcmd(&server, "getswitchstate", "inval\n").await;
    mock_switchcmd(&server, "getdeviceinfos", "<device identifier=\"1\"><present>1</present></device>").await;
    Mock::given(method("GET"))
        .and(query_param("switchcmd", "getswitchpower"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let client = GatewayClient::new(&server.uri()).unwrap();
    assert!(client.get_temperature(SID, "1").await.unwrap_err().is_query());
    assert!(client.get_switch_state(SID, "1").await.unwrap_err().is_query());
    assert!(client.get_switch_power(SID, "1").await.unwrap_err().is_query());
    assert!(client.get_humidity(SID, "1").await.unwrap_err().is_query());
}

#[tokio::test]
async fn test_unreachable_gateway() {
    let client = GatewayClient::new("http://127.0.0.1:9").unwrap();
    assert!(client.list_devices(SID).await.unwrap_err().is_query());
}
