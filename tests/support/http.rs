use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Loopback server answering every request with the same zip download.
pub struct ZipServer {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
}

impl ZipServer {
    pub fn start(entries: &[(&str, &[u8])]) -> Self {
        Self::serve(zip_bytes(entries))
    }

    /// Serve `body` verbatim as the archive, e.g. a deliberately damaged zip.
    pub fn serve(body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                counter.fetch_add(1, Ordering::SeqCst);
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(&body);
            }
        });
        Self { base_url, requests }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(data).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Flip 64 bytes in the middle of a zip so its entry fails the CRC check
/// partway through decompression.
pub fn corrupt_middle(mut bytes: Vec<u8>) -> Vec<u8> {
    let mid = bytes.len() / 2;
    for byte in &mut bytes[mid..mid + 64] {
        *byte ^= 0xFF;
    }
    bytes
}
