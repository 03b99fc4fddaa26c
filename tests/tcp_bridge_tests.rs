use rocc_link::simulator::{self, SimulatorConfig, TelemetryGenerator};
use rocc_link::transport::tcp::{read_message, write_message, LinkMessage, TcpPeripheral};
use rocc_link::{
    Adapter, Cancellation, ClientConfig, DeviceInfo, DiscoveryError, LogSink, ScanFilter, Session,
    TcpAdapter, MAX_LINK_MESSAGE_SIZE, STATUS_CHAR_UUID,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn test_session_over_tcp_bridge() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let device_side = tokio::spawn(async move {
        let device = DeviceInfo::rocc("bridge-0", "NRS-ROCC-BRIDGE");
        let mut port = TcpPeripheral::accept(&listener, &device).await?;
        let config = SimulatorConfig {
            interval: Duration::from_millis(5),
            count: Some(6),
            event_every: 3,
        };
        let mut generator = TelemetryGenerator::new(Some(99));
        let sent = simulator::run(&mut port, &mut generator, &config).await?;
        // Dropping the port closes the stream.
        drop(port);
        anyhow::Ok(sent)
    });

    let cancel = Cancellation::new();
    let mut session = Session::new(TcpAdapter::new(addr.to_string()), LogSink, ClientConfig::default());
    let device = session.connect(&cancel).await?;
    assert_eq!(device.display_name(), "NRS-ROCC-BRIDGE");

    let stats = tokio::time::timeout(Duration::from_secs(10), session.run(&cancel)).await??;
    assert_eq!(device_side.await??, 6);
    assert_eq!(stats.total(), 8);
    assert_eq!(stats.decoded, 8);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subscribe_precedes_enable_command() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let device_side = tokio::spawn(async move {
        let device = DeviceInfo::rocc("bridge-1", "NRS-ROCC-1");
        let mut port = TcpPeripheral::accept(&listener, &device).await?;
        let first = port.recv().await?;
        let second = port.recv().await?;
        port.notify(&[0xA2, 0x05]).await?;
        anyhow::Ok((first, second))
    });

    let mut adapter = TcpAdapter::new(addr.to_string());
    let device = adapter.discover(&ScanFilter::default()).await?;
    let mut link = adapter.connect(&device).await?;
    link.notifications.subscribe().await?;
    link.commands.write(&[0x80]).await?;

    assert_eq!(link.notifications.next_frame().await?, Some(vec![0xA2, 0x05]));
    let (first, second) = device_side.await??;
    assert_eq!(first, Some(LinkMessage::Subscribe));
    assert_eq!(second, Some(LinkMessage::Write(vec![0x80])));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_advertisement_must_match_filter() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let device = DeviceInfo::rocc("bridge-2", "HeartMonitor");
        let _port = TcpPeripheral::accept(&listener, &device).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let mut adapter = TcpAdapter::new(addr.to_string());
    let result = adapter.discover(&ScanFilter::default()).await;
    assert_eq!(result, Err(DiscoveryError::NoMatch("HeartMonitor".to_string())));

    // Nothing was discovered, so there is nothing to connect to.
    let device = DeviceInfo::rocc("bridge-2", "HeartMonitor");
    assert!(adapter.connect(&device).await.is_err());
    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_advertisement_without_status_characteristic() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let mut device = DeviceInfo::rocc("bridge-3", "NRS-ROCC-3");
        device.characteristics.retain(|uuid| uuid != STATUS_CHAR_UUID);
        let _port = TcpPeripheral::accept(&listener, &device).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let mut adapter = TcpAdapter::new(addr.to_string());
    let device = adapter.discover(&ScanFilter::default()).await?;
    assert!(!device.has_characteristic(STATUS_CHAR_UUID));
    let err = match adapter.connect(&device).await {
        Ok(_) => panic!("connect should fail without a status characteristic"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("Status characteristic not available"));
    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_zero_length_link_message() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&[0u8, 0, 0, 0]).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let mut adapter = TcpAdapter::new(addr.to_string());
    let result = adapter.discover(&ScanFilter::default()).await;
    match result {
        Err(DiscoveryError::Transport(detail)) => assert!(detail.contains("Invalid message length")),
        other => panic!("expected transport error, got {:?}", other),
    }
    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_link_message() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Length prefix far above the link limit.
        socket.write_all(&[0xFF, 0xFF, 0xFF, 0xFF]).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let mut adapter = TcpAdapter::new(addr.to_string());
    let result = adapter.discover(&ScanFilter::default()).await;
    match result {
        Err(DiscoveryError::Transport(detail)) => assert!(detail.contains("too large")),
        other => panic!("expected transport error, got {:?}", other),
    }
    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_peer_closing_ends_stream() -> anyhow::Result<()> {
    let (mut client, mut server) = tokio::io::duplex(1024);
    write_message(&mut server, &LinkMessage::Notify(vec![0xA1]), MAX_LINK_MESSAGE_SIZE).await?;
    drop(server);

    let first = read_message(&mut client, MAX_LINK_MESSAGE_SIZE).await?;
    assert_eq!(first, Some(LinkMessage::Notify(vec![0xA1])));
    assert_eq!(read_message(&mut client, MAX_LINK_MESSAGE_SIZE).await?, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_writer_refuses_oversized_message() {
    let (mut client, _server) = tokio::io::duplex(1024);
    let msg = LinkMessage::Notify(vec![0u8; 128]);
    let err = write_message(&mut client, &msg, 64).await.unwrap_err();
    assert!(err.to_string().contains("Message too large"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_bridge() {
    // Bind and immediately drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut adapter = TcpAdapter::with_timeout(addr.to_string(), Duration::from_millis(500));
    let result = adapter.discover(&ScanFilter::default()).await;
    assert!(matches!(
        result,
        Err(DiscoveryError::Transport(_)) | Err(DiscoveryError::Timeout)
    ));
}
