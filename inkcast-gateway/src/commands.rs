//! Command implementations

use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use inkcast_core::ident::{autocorrelation, DEFAULT_THRESHOLD};
use inkcast_core::{CorrelationSummary, DistributionServer, IdentifierSelector};
use inkcast_drivers::radio::{reg, A7106Error};
use inkcast_protocol::{HelloMessage, HELLO_SIZE};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::feed::{load_image, ImageFeed, SharedImage};
use crate::radio;

/// Candidates drawn per requested identifier before giving up
const MAX_ATTEMPTS: u64 = 100_000_000;

/// Run the distribution server until the process is stopped
pub fn serve(config: &GatewayConfig) -> Result<()> {
    let image = load_image(&config.image.path)?;
    log::info!(
        "serving {} as image {:08x}",
        config.image.path.display(),
        image.id()
    );

    let shared = SharedImage::new(image);
    ImageFeed::new(
        config.image.path.clone(),
        Duration::from_millis(config.image.poll_interval_ms),
        shared.clone(),
    )
    .spawn()?;

    let gateway_id = config.radio.gateway_id;
    radio::check_address(gateway_id);
    let (radio, _) = radio::open(&config.radio, gateway_id)?;

    let start = Instant::now();
    let mut server = DistributionServer::new(radio, shared, gateway_id);
    server.run(move || start.elapsed().as_millis() as u64)
}

/// Print freshly selected identifiers
pub fn gen_id(prefix: u8, threshold: u32, count: usize) -> Result<()> {
    let selector = IdentifierSelector::new(prefix)
        .and_then(|s| s.with_threshold(threshold))
        .map_err(|e| GatewayError::InvalidArgument(e.to_string()))?;
    let mut rng = rand::thread_rng();

    for _ in 0..count {
        let id = selector.try_generate(&mut rng, MAX_ATTEMPTS).ok_or_else(|| {
            GatewayError::InvalidArgument(format!(
                "no identifier with prefix {:x} passed threshold {} in {} attempts",
                prefix, threshold, MAX_ATTEMPTS
            ))
        })?;
        let summary = CorrelationSummary::of(id, threshold);
        println!("{:08x} {:.1}", id, summary.mean);
    }
    Ok(())
}

/// Print the autocorrelation of existing identifiers
pub fn check_id(ids: &[String]) -> Result<()> {
    for text in ids {
        let id = parse_hex(text)?;
        let scores = autocorrelation(id);
        let summary = CorrelationSummary::of(id, DEFAULT_THRESHOLD);
        println!(
            "{:08x} {:.1} {} {:?}",
            id,
            summary.mean,
            if summary.is_acceptable() { "ok" } else { "REJECT" },
            scores
        );
    }
    Ok(())
}

/// Initialize the radio and print every register
pub fn dump_regs(config: &GatewayConfig) -> Result<()> {
    let (mut radio, report) = radio::open(&config.radio, config.radio.gateway_id)?;
    println!(
        "calibration: control=0x{:02x} if=0x{:02x} vco_current=0x{:02x} vco_bank=0x{:02x} ({})",
        report.control,
        report.if_filter,
        report.vco_current,
        report.vco_bank,
        if report.is_ok() { "ok" } else { "FAILED" }
    );
    for (address, value) in radio.dump_registers()? {
        println!(
            "0x{:02x} ({}): 0x{:02x}  [{:08b}]",
            address,
            reg::name(address),
            value,
            value
        );
    }
    Ok(())
}

/// Receive packets forever and log them
pub fn listen(config: &GatewayConfig, address: Option<u32>) -> Result<()> {
    let address = address.unwrap_or(config.radio.gateway_id);
    let (mut radio, _) = radio::open(&config.radio, address)?;
    log::info!("listening on {:08x}", address);

    loop {
        match radio.blocking_receive() {
            Ok(packet) => log_packet(&packet),
            Err(e @ A7106Error::Rx(_)) => log::warn!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Transmit a timestamp packet periodically
pub fn beacon(config: &GatewayConfig, address: Option<u32>, interval_ms: u64) -> Result<()> {
    let address = address.unwrap_or(config.radio.gateway_id);
    let (mut radio, _) = radio::open(&config.radio, address)?;
    let capacity = config.radio.packet_length as usize - 1;
    log::info!("sending beacons to {:08x}", address);

    loop {
        let text = timestamp();
        let data = &text.as_bytes()[..text.len().min(capacity)];

        let mut payload = Vec::with_capacity(data.len() + 1);
        payload.push(data.len() as u8);
        payload.extend_from_slice(data);

        log::info!("sending packet, data_length={} data={}", data.len(), text);
        radio.transmit(&payload)?;
        thread::sleep(Duration::from_millis(interval_ms));
    }
}

/// Parse a hex identifier, with or without a `0x` prefix
pub fn parse_hex(text: &str) -> Result<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .map_err(|e| GatewayError::InvalidArgument(format!("{}: {}", text, e)))
}

fn log_packet(packet: &[u8]) {
    let hex: String = packet.iter().map(|b| format!("{:02x}", b)).collect();
    log::info!("got packet, length={} data={}", packet.len(), hex);

    // Length-prefixed text from another gateway's beacon
    if let Some((&len, rest)) = packet.split_first() {
        if let Some(text) = rest
            .get(..len as usize)
            .and_then(|data| std::str::from_utf8(data).ok())
        {
            if !text.is_empty() {
                log::info!("  text: {}", text);
            }
        }
    }

    if packet.len() >= HELLO_SIZE {
        if let Ok(hello) = HelloMessage::decode(packet) {
            log::info!(
                "  as hello: client {:08x} image {:08x} missing {}",
                hello.client_id,
                hello.image_id,
                hello.missing.missing_count()
            );
        }
    }
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}
