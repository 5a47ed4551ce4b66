//! TCP transport against a local listener.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tswio_protocol::{InputValue, Message, SetOutput, OutputLevel};
use tswio_transport::{DeviceTransport, DeviceTransportExt, TcpTransport, TransportError};
use tswio_test_helpers::must;

#[tokio::test]
async fn messages_cross_the_wire_framed() {
    let listener = must(TcpListener::bind("127.0.0.1:0").await);
    let addr = must(listener.local_addr()).to_string();

    let board = tokio::spawn(async move {
        let (mut socket, _) = must(listener.accept().await);
        let mut received = [0u8; 5];
        must(socket.read_exact(&mut received).await);
        // InputValue { pin: 3, value: -2 }
        must(socket.write_all(&[4, 0, 0x05, 3, 0xFE, 0xFF]).await);
        received
    });

    let transport = must(TcpTransport::connect(&addr).await);
    assert_eq!(transport.name(), format!("tcp://{addr}"));

    must(
        transport
            .send_message(&Message::SetOutput(SetOutput {
                pin: 5,
                value: OutputLevel::High,
            }))
            .await,
    );

    let reply = must(transport.recv_message().await);
    assert_eq!(reply, Message::InputValue(InputValue { pin: 3, value: -2 }));

    let sent = must(board.await);
    assert_eq!(sent, [3, 0, 0x07, 5, 1]);
}

#[tokio::test]
async fn peer_hangup_reports_closed() {
    let listener = must(TcpListener::bind("127.0.0.1:0").await);
    let addr = must(listener.local_addr()).to_string();
    let board = tokio::spawn(async move {
        let (socket, _) = must(listener.accept().await);
        drop(socket);
    });

    let transport = must(TcpTransport::connect(&addr).await);
    must(board.await);
    assert!(matches!(
        transport.recv().await,
        Err(TransportError::Closed(_))
    ));
}
