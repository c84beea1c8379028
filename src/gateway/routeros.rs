//! RouterOS API client implementing [`DeviceGateway`]

use super::codec::{read_sentence, write_sentence, Attributes, Reply, ReplyKind};
use super::{BandwidthTestRequest, DeviceGateway, RawSample, RegistrationEntry, WirelessInterface};
use crate::error::{AppError, Result};
use crate::models::Credentials;
use async_trait::async_trait;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Connection to the RouterOS API service of one access point
pub struct RouterOsGateway<S = TcpStream> {
    stream: S,
    /// Longest wait for any single reply sentence
    io_timeout: Duration,
}

impl RouterOsGateway<TcpStream> {
    /// Open a TCP connection to the API port and log in
    pub async fn connect(
        address: IpAddr,
        credentials: &Credentials,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self> {
        let socket = SocketAddr::new(address, credentials.port);
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(socket))
            .await
            .map_err(|_| AppError::connection(format!("Timed out connecting to {}", socket)))?
            .map_err(|e| AppError::connection(format!("Failed to connect to {}: {}", socket, e)))?;
        stream.set_nodelay(true)?;

        let mut gateway = Self::new(stream, io_timeout);
        gateway.login(&credentials.username, &credentials.password).await?;
        Ok(gateway)
    }
}

impl<S> RouterOsGateway<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream; call [`login`](Self::login) next
    pub fn new(stream: S, io_timeout: Duration) -> Self {
        Self { stream, io_timeout }
    }

    /// Plaintext login (RouterOS 6.43 and later)
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let words = vec![
            "/login".to_string(),
            format!("=name={}", username),
            format!("=password={}", password),
        ];

        match self.command(&words).await {
            Ok(records) => {
                // Pre-6.43 devices answer with an MD5 challenge instead
                if records.iter().any(|r| r.contains_key("ret")) {
                    return Err(AppError::auth("Device requested legacy challenge login, which is not supported"));
                }
                Ok(())
            }
            Err(AppError::Device(message)) => Err(AppError::auth(message)),
            Err(other) => Err(other),
        }
    }

    /// Send one command and collect its `!re` records.
    ///
    /// Replies are read up to the trailing `!done` in every case, so the
    /// connection stays in sync. A `!trap` then becomes [`AppError::Device`]
    /// and an unrecognised reply [`AppError::Parse`]; `!empty` contributes no
    /// records. `!fatal`, a read timeout or a socket failure become
    /// [`AppError::Connection`].
    pub async fn command(&mut self, words: &[String]) -> Result<Vec<Attributes>> {
        self.command_within(words, self.io_timeout).await
    }

    /// [`command`](Self::command) with a custom wait for each reply sentence
    pub async fn command_within(&mut self, words: &[String], reply_timeout: Duration) -> Result<Vec<Attributes>> {
        write_sentence(&mut self.stream, words).await?;

        let mut records = Vec::new();
        let mut trap: Option<String> = None;
        let mut unreadable: Option<String> = None;

        loop {
            let sentence = tokio::time::timeout(reply_timeout, read_sentence(&mut self.stream))
                .await
                .map_err(|_| {
                    AppError::connection(format!(
                        "No reply to '{}' within {}s",
                        words.first().map(String::as_str).unwrap_or(""),
                        reply_timeout.as_secs()
                    ))
                })??;

            if sentence.is_empty() {
                continue;
            }

            let reply = match Reply::parse(&sentence) {
                Ok(reply) => reply,
                Err(error) => {
                    unreadable.get_or_insert_with(|| error.message().to_string());
                    continue;
                }
            };
            match reply.kind {
                ReplyKind::Data => records.push(reply.attributes),
                ReplyKind::Empty => {}
                ReplyKind::Trap => {
                    trap.get_or_insert_with(|| reply.error_message());
                }
                ReplyKind::Fatal => {
                    return Err(AppError::connection(format!("Device closed the session: {}", reply.error_message())));
                }
                ReplyKind::Done => {
                    // Login and a few other commands return data on !done
                    if !reply.attributes.is_empty() {
                        records.push(reply.attributes);
                    }
                    break;
                }
            }
        }

        match (trap, unreadable) {
            (Some(message), _) => Err(AppError::device(message)),
            (None, Some(message)) => Err(AppError::parse(message)),
            (None, None) => Ok(records),
        }
    }

    /// Close the connection
    pub async fn disconnect(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl<S> DeviceGateway for RouterOsGateway<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn wireless_interfaces(&mut self) -> Result<Vec<WirelessInterface>> {
        let records = self.command(&["/interface/wireless/print".to_string()]).await?;

        records
            .into_iter()
            .map(|record| {
                let id = record
                    .get(".id")
                    .cloned()
                    .ok_or_else(|| AppError::parse("Wireless interface without .id"))?;
                let name = record.get("name").cloned().unwrap_or_else(|| id.clone());
                Ok(WirelessInterface { id, name })
            })
            .collect()
    }

    async fn set_frequency(&mut self, interface_id: &str, frequency: u32) -> Result<()> {
        let words = vec![
            "/interface/wireless/set".to_string(),
            format!("=.id={}", interface_id),
            format!("=frequency={}", frequency),
        ];
        self.command(&words).await.map(|_| ())
    }

    async fn registered_stations(&mut self) -> Result<Vec<RegistrationEntry>> {
        let records = self
            .command(&["/interface/wireless/registration-table/print".to_string()])
            .await?;

        Ok(records
            .into_iter()
            .map(|record| RegistrationEntry {
                interface: record.get("interface").cloned(),
                mac_address: record.get("mac-address").cloned(),
                signal_strength_dbm: record.get("signal-strength").and_then(|v| parse_signal_strength(v)),
            })
            .collect())
    }

    async fn ping(&mut self, source: IpAddr, target: IpAddr, count: u32) -> Result<f64> {
        let words = vec![
            "/ping".to_string(),
            format!("=address={}", target),
            format!("=count={}", count),
            format!("=src-address={}", source),
        ];
        let records = self.command(&words).await?;

        // The last record carries the running summary
        let avg_rtt = records
            .last()
            .and_then(|record| record.get("avg-rtt"))
            .ok_or_else(|| AppError::timeout(format!("No echo replies from {}", target)))?;

        parse_rtt_ms(avg_rtt)
            .ok_or_else(|| AppError::parse(format!("Unrecognised avg-rtt value '{}'", avg_rtt)))
    }

    async fn bandwidth_test(&mut self, request: &BandwidthTestRequest) -> Result<Vec<RawSample>> {
        let mut words = vec!["/tool/bandwidth-test".to_string()];
        words.extend(
            request
                .attributes()
                .into_iter()
                .map(|(key, value)| format!("={}={}", key, value)),
        );
        // The device may stay silent while it connects to the peer
        let reply_timeout = self.io_timeout + Duration::from_secs(u64::from(request.duration_seconds));
        self.command_within(&words, reply_timeout).await
    }
}

/// Parse `-61`, `-61@6Mbps` or `-61dBm` into dBm
pub fn parse_signal_strength(raw: &str) -> Option<i32> {
    let value = raw.split('@').next()?.trim();
    let value = value.strip_suffix("dBm").unwrap_or(value).trim();
    value.parse().ok()
}

fn rtt_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?:(\d+)s)?(?:(\d+(?:\.\d+)?)ms)?(?:(\d+)us)?$").ok())
        .as_ref()
}

/// Parse a RouterOS duration such as `10ms`, `1ms234us`, `850us` or
/// `1s5ms` into milliseconds
pub fn parse_rtt_ms(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let captures = rtt_pattern()?.captures(raw)?;
    let part = |index: usize| -> Option<f64> { captures.get(index).and_then(|m| m.as_str().parse().ok()) };

    let seconds = part(1);
    let millis = part(2);
    let micros = part(3);
    if seconds.is_none() && millis.is_none() && micros.is_none() {
        return None;
    }

    Some(seconds.unwrap_or(0.0) * 1000.0 + millis.unwrap_or(0.0) + micros.unwrap_or(0.0) / 1000.0)
}
