//! Caller identification: client address and user agent.
//!
//! The service runs behind a reverse proxy, so forwarding headers are
//! trusted. The address is resolved from, in order: the first valid entry of
//! `X-Forwarded-For`, `X-Real-IP`, then the TCP peer.

use std::{
  convert::Infallible,
  net::{IpAddr, SocketAddr},
};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use survey_core::intake::ClientInfo;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Extractor wrapping [`ClientInfo`]. Never rejects.
#[derive(Debug, Clone)]
pub struct Client(pub ClientInfo);

impl<S> FromRequestParts<S> for Client
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let peer = parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| *addr);

    Ok(Client(ClientInfo {
      address:    resolve_client_addr(&parts.headers, peer).map(|ip| ip.to_string()),
      user_agent: user_agent(&parts.headers),
    }))
  }
}

/// Best-effort client address.
pub fn resolve_client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
  let forwarded = headers
    .get_all(X_FORWARDED_FOR)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .find_map(parse_addr);

  forwarded
    .or_else(|| {
      headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_addr)
    })
    .or_else(|| peer.map(|p| p.ip()))
    .map(unmap_ipv4)
}

/// Accepts a bare address, `ip:port`, or `[v6]:port`.
fn parse_addr(raw: &str) -> Option<IpAddr> {
  let raw = raw.trim();
  raw
    .parse::<IpAddr>()
    .ok()
    .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// `::ffff:a.b.c.d` and `a.b.c.d` are the same client.
fn unmap_ipv4(ip: IpAddr) -> IpAddr {
  match ip {
    IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
    IpAddr::V4(_) => ip,
  }
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
  headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .filter(|v| !v.is_empty())
    .map(str::to_owned)
}
