//! pws - lab Grantor and Requestor
//!
//! Both roles talk over the TCP GATT bridge: the Grantor listens as the
//! relay end, the Requestor connects as its client.
//!
//! ```bash
//! pws identity --account user@example.com --anchor anchor.json --out identity.json
//! pws grantor lambda secret --trust-anchor anchor.json
//! pws requestor user@example.com --bridge 127.0.0.1 --identity identity.json
//! ```
//!
//! `RUST_LOG` selects the log filter (default `info`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use pws_protocol::advertisement::{
    AppleAdvertisement, ContinuityMessage, Discovery, NearbyActionFrame,
};
use pws_protocol::core::DEFAULT_BRIDGE_PORT;
use pws_protocol::crypto::SigningIdentity;
use pws_protocol::identity::{
    Ed25519IdentityVerifier, IdentityBundle, LocalAccountIdentity, TrustAnchor,
};
use pws_protocol::pairing::{
    ConfigFlag, GrantorShareInfo, PairingSession, RequestorShareInfo, SessionConfig, run_session,
};
use pws_protocol::transport::bridge;

#[derive(Parser)]
#[command(name = "pws")]
#[command(about = "Password Sharing lab tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Share a network with the next Requestor that connects
    Grantor {
        ssid: String,
        psk: String,
        /// Address the relay end listens on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
        /// Anchor file whose public key is trusted
        #[arg(long)]
        trust_anchor: PathBuf,
        #[arg(long)]
        mail_hash: Option<String>,
        #[arg(long)]
        phone_hash: Option<String>,
        /// Send `eh`/`ph` (off by default)
        #[arg(long)]
        share_contact_hashes: bool,
        #[arg(long = "flag", value_enum)]
        flags: Vec<FlagArg>,
        /// Scanned manufacturer data (hex); one must match before serving
        #[arg(long = "advertisement")]
        advertisements: Vec<String>,
    },
    /// Ask a Grantor for credentials through a GATT relay
    Requestor {
        apple_account_id: String,
        #[arg(long)]
        bridge: String,
        #[arg(long, default_value_t = DEFAULT_BRIDGE_PORT)]
        port: u16,
        /// Identity bundle written by `pws identity`
        #[arg(long)]
        identity: PathBuf,
        /// Network to request: prints its advertisement and rejects
        /// credentials for any other network
        #[arg(long)]
        ssid: Option<String>,
    },
    /// Issue an account identity, creating the anchor if needed
    Identity {
        #[arg(long)]
        account: String,
        #[arg(long)]
        anchor: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FlagArg {
    NoPsk,
    NoSsid,
    NoPhoneHash,
    NoMailHash,
    NoSsidCheck,
    /// Lab only: share with peers whose identity does not verify
    IgnoreInvalidPeerValidation,
}

impl From<FlagArg> for ConfigFlag {
    fn from(flag: FlagArg) -> Self {
        match flag {
            FlagArg::NoPsk => ConfigFlag::NoPsk,
            FlagArg::NoSsid => ConfigFlag::NoSsid,
            FlagArg::NoPhoneHash => ConfigFlag::NoPhoneHash,
            FlagArg::NoMailHash => ConfigFlag::NoMailHash,
            FlagArg::NoSsidCheck => ConfigFlag::NoSsidCheck,
            FlagArg::IgnoreInvalidPeerValidation => ConfigFlag::IgnoreInvalidPeerValidation,
        }
    }
}

/// Trust anchor on disk. Grantors only need the public half.
#[derive(Serialize, Deserialize)]
struct AnchorFile {
    #[serde(with = "hex::serde")]
    public_key: Vec<u8>,
    #[serde(with = "hex::serde", default, skip_serializing_if = "Vec::is_empty")]
    secret_key: Vec<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Grantor {
            ssid,
            psk,
            listen,
            trust_anchor,
            mail_hash,
            phone_hash,
            share_contact_hashes,
            flags,
            advertisements,
        } => {
            let mut share = GrantorShareInfo::new(&ssid, &psk);
            if let Some(hash) = &mail_hash {
                share = share.with_mail_hash(hash);
            }
            if let Some(hash) = &phone_hash {
                share = share.with_phone_hash(hash);
            }
            let mut config = SessionConfig::default().with_flags(flags.into_iter().map(Into::into));
            if !share_contact_hashes {
                config = config.with_flags([ConfigFlag::NoPhoneHash, ConfigFlag::NoMailHash]);
            }
            if config.has(ConfigFlag::IgnoreInvalidPeerValidation) {
                warn!("peer identity failures will be ignored");
            }
            cmd_grantor(share, config, &listen, &trust_anchor, &advertisements).await
        }
        Commands::Requestor {
            apple_account_id,
            bridge,
            port,
            identity,
            ssid,
        } => cmd_requestor(&apple_account_id, &bridge, port, &identity, ssid.as_deref()).await,
        Commands::Identity {
            account,
            anchor,
            out,
        } => cmd_identity(&account, &anchor, &out),
    }
}

async fn cmd_grantor(
    share: GrantorShareInfo,
    config: SessionConfig,
    listen: &str,
    trust_anchor: &Path,
    advertisements: &[String],
) -> Result<()> {
    let anchor = read_anchor(trust_anchor)?;
    let public_key: [u8; 32] = anchor
        .public_key
        .as_slice()
        .try_into()
        .context("anchor public key must be 32 bytes")?;

    if !advertisements.is_empty() {
        let reports = advertisements
            .iter()
            .map(|adv| hex::decode(adv).with_context(|| format!("bad advertisement hex: {adv}")))
            .collect::<Result<Vec<_>>>()?;
        let discovery = Discovery::new(&share, &config);
        let Some(request) = discovery.first_match(reports.iter().map(Vec::as_slice)) else {
            bail!("no password request for {}", share.ssid);
        };
        info!(apple_id_hash = %hex::encode(request.apple_id_hash), "serving request");
    }

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to listen on {listen}"))?;
    info!(%listen, ssid = %share.ssid, "waiting for requestor");
    let link = bridge::accept(&listener).await?;

    let verifier = Ed25519IdentityVerifier::new(public_key);
    let session = PairingSession::grantor(share, config, Arc::new(verifier))?;
    let outcome = run_session(session, link).await?;
    info!(peer = %hex::encode(outcome.peer_public_key), "credentials shared");
    Ok(())
}

async fn cmd_requestor(
    account: &str,
    host: &str,
    port: u16,
    identity: &Path,
    ssid: Option<&str>,
) -> Result<()> {
    let bytes = fs::read(identity)
        .with_context(|| format!("failed to read {}", identity.display()))?;
    let bundle: IdentityBundle = serde_json::from_slice(&bytes).context("bad identity bundle")?;
    let identity = bundle_for_account(bundle, account)
        .with_context(|| format!("unusable identity {}", identity.display()))?;

    let mut share = RequestorShareInfo::new(account, &format!("{host}:{port}"));
    if let Some(ssid) = ssid {
        share = share.with_ssid(ssid);
    }
    if let Some(request) = share.advertisement() {
        let adv = AppleAdvertisement {
            messages: vec![ContinuityMessage::NearbyAction(
                NearbyActionFrame::password_request(request),
            )],
        };
        println!("advertisement: {}", hex::encode(adv.encode()));
    }

    let link = bridge::connect((host, port))
        .await
        .with_context(|| format!("failed to reach relay at {host}:{port}"))?;
    let session = PairingSession::requestor(share, SessionConfig::default(), Arc::new(identity))?;
    let outcome = run_session(session, link).await?;

    let Some(creds) = outcome.credentials else {
        bail!("session completed without credentials");
    };
    println!("ssid: {}", creds.ssid.as_deref().unwrap_or("-"));
    println!("psk: {}", creds.psk.as_deref().unwrap_or("-"));
    Ok(())
}

/// Restore `bundle`, which must have been issued for `account`.
fn bundle_for_account(bundle: IdentityBundle, account: &str) -> Result<LocalAccountIdentity> {
    if bundle.account_id != account {
        bail!("issued for {}, not {account}", bundle.account_id);
    }
    Ok(bundle.into_identity()?)
}

fn cmd_identity(account: &str, anchor_path: &Path, out: &Path) -> Result<()> {
    let anchor = if anchor_path.exists() {
        let file = read_anchor(anchor_path)?;
        if file.secret_key.is_empty() {
            bail!("{} has no secret key", anchor_path.display());
        }
        TrustAnchor::from_identity(SigningIdentity::from_bytes(&file.secret_key)?)
    } else {
        let anchor = TrustAnchor::generate();
        let file = AnchorFile {
            public_key: anchor.public_key().to_vec(),
            secret_key: anchor.identity().secret_bytes().to_vec(),
        };
        fs::write(anchor_path, serde_json::to_vec_pretty(&file)?)?;
        info!(path = %anchor_path.display(), "trust anchor created");
        anchor
    };

    let identity = LocalAccountIdentity::provision(&anchor, account)?;
    let bundle = IdentityBundle::from_identity(account, &identity);
    fs::write(out, serde_json::to_vec_pretty(&bundle)?)?;
    info!(%account, path = %out.display(), "identity issued");
    Ok(())
}

fn read_anchor(path: &Path) -> Result<AnchorFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("bad anchor file {}", path.display()))
}
