use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{App, AppSettings, Arg};

use upnp_miniserver::{
    Callbacks, Config, Connection, Error, MiniServer, RequestHandler, SsdpHandler,
};

// A minimal UPnP device shell: answers every web request with a canned
// page and prints SSDP searches as they arrive.
//
// cargo run --package upnp-miniserver --example miniserver_device -- --ipv4 192.168.1.2

struct HelloWeb;

#[async_trait]
impl RequestHandler for HelloWeb {
    async fn handle(&self, msg: &httpmsg::HttpMessage, conn: &mut Connection) {
        println!("web request {} {} from {}", msg.method, msg.uri, conn.peer);
        let body = b"<html><body>upnp-rs miniserver</body></html>";
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        let _ = conn.send(head.as_bytes()).await;
        let _ = conn.send(body).await;
    }
}

struct PrintSsdp;

#[async_trait]
impl SsdpHandler for PrintSsdp {
    async fn on_device_request(&self, msg: &httpmsg::HttpMessage, src: SocketAddr) {
        println!(
            "M-SEARCH from {src}, ST: {}",
            msg.headers.find_text(httpmsg::HeaderId::St).unwrap_or("-")
        );
    }

    async fn on_ctrlpt_message(&self, msg: &httpmsg::HttpMessage, src: SocketAddr) {
        println!("SSDP {} from {src}", msg.method);
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} [{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                chrono::Local::now().format("%H:%M:%S.%6f"),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();

    let mut app = App::new("miniserver device")
        .version("0.1.0")
        .about("An example of the upnp-rs miniserver")
        .setting(AppSettings::DeriveDisplayOrder)
        .setting(AppSettings::SubcommandsNegateReqs)
        .arg(
            Arg::with_name("FULLHELP")
                .help("Prints more detailed help information")
                .long("fullhelp"),
        )
        .arg(
            Arg::with_name("ipv4")
                .required_unless("FULLHELP")
                .takes_value(true)
                .default_value("127.0.0.1")
                .long("ipv4")
                .help("Numeric IPv4 interface address to serve on."),
        )
        .arg(
            Arg::with_name("port")
                .takes_value(true)
                .default_value("0")
                .long("port")
                .help("Listening port; 0 picks a random dynamic port."),
        );

    let matches = app.clone().get_matches();

    if matches.is_present("FULLHELP") {
        app.print_long_help().unwrap();
        std::process::exit(0);
    }

    let ipv4 = matches.value_of("ipv4").unwrap();
    let port: u16 = matches.value_of("port").unwrap().parse().unwrap();

    let server = MiniServer::new(Config {
        if_ipv4: ipv4.to_owned(),
        ..Default::default()
    });
    server.set_callbacks(Callbacks {
        web: Some(Arc::new(HelloWeb)),
        ssdp: Some(Arc::new(PrintSsdp)),
        ..Default::default()
    })?;

    let ports = server.start(port, 0, 0).await?;
    println!("miniserver listening on http://{ipv4}:{}", ports.v4);

    println!("Press ctrl-c to stop server");
    tokio::signal::ctrl_c().await.unwrap();
    server.stop().await?;
    Ok(())
}
