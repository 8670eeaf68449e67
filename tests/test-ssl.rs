use ::local_test_server::TestServer;
use ::std::net::SocketAddr;

fn new_trusting_client(server: &TestServer) -> ::reqwest::Client {
    let ca_cert = ::reqwest::Certificate::from_pem(server.ssl_cert().ca_keys.cert.as_bytes())
        .expect("Should parse the CA certificate");

    ::reqwest::Client::builder()
        .use_rustls_tls()
        .add_root_certificate(ca_cert)
        .build()
        .expect("Should create a client trusting the test CA")
}

#[tokio::test]
async fn it_should_serve_ssl_traffic() {
    let server = TestServer::new().await.expect("Should create test server");
    server.get("/foo", || async { "bar" });

    let client = new_trusting_client(&server);
    let url = server.ssl_url().unwrap().join("/foo").unwrap();
    let response = client
        .get(url.as_str())
        .send()
        .await
        .expect("Should validate the certificate for localhost");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "bar");
}

#[tokio::test]
async fn it_should_embed_the_requested_certificate_subject() {
    let server = TestServer::builder()
        .certificate("foo.bar")
        .build()
        .await
        .expect("Should create test server");
    server.get("/foo", || async { "bar" });

    let ssl_port = server.ssl_port().unwrap();
    let server_addr: SocketAddr = ([127, 0, 0, 1], ssl_port).into();

    let ca_cert = ::reqwest::Certificate::from_pem(server.ssl_cert().ca_keys.cert.as_bytes())
        .expect("Should parse the CA certificate");
    let client = ::reqwest::Client::builder()
        .use_rustls_tls()
        .add_root_certificate(ca_cert)
        .resolve("foo.bar", server_addr)
        .build()
        .expect("Should create a client trusting the test CA");

    let response = client
        .get(format!("https://foo.bar:{ssl_port}/foo"))
        .send()
        .await
        .expect("Should validate the certificate for foo.bar");

    assert_eq!(response.text().await.unwrap(), "bar");
}

#[tokio::test]
async fn it_should_keep_the_same_certificate_across_restarts() {
    let server = TestServer::new().await.expect("Should create test server");
    server.get("/ping", || async { "pong" });

    let cert_before = server.ssl_cert().cert.clone();

    server.close().await.expect("Should close");
    server.listen().await.expect("Should listen again");

    assert_eq!(server.ssl_cert().cert, cert_before);

    let client = new_trusting_client(&server);
    let url = server.ssl_url().unwrap().join("/ping").unwrap();
    let response = client
        .get(url.as_str())
        .send()
        .await
        .expect("Should still validate after the restart");

    assert_eq!(response.text().await.unwrap(), "pong");
}
