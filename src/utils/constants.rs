//! Constants Module - Single Source of Truth
//!
//! Chain ids, default endpoint lists, network metadata and policy constants
//! used across the crate live here. Other modules read these through
//! functions rather than hardcoding values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "ChainSentinel";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "BlockchainSecurityScanner/1.0";

// ============================================
// RPC CONSTANTS
// ============================================

/// Default per-endpoint connect/request timeout (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default attempts per endpoint before advancing to the next one
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Linear backoff unit: attempt 1 waits 1x, attempt 2 waits 2x, ...
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

// ============================================
// INFERENCE CONSTANTS
// ============================================

pub const DEFAULT_INFERENCE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_INFERENCE_MODEL: &str = "gpt-4o";
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 60;

/// Requests admitted per window for each rate-limited inference class
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 50;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

// ============================================
// UPLOAD CONSTANTS
// ============================================

pub const ALLOWED_EXTENSIONS: [&str; 2] = ["sol", "txt"];

/// 16 MiB max upload
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Ethereum Goerli testnet
pub const CHAIN_ID_GOERLI: u64 = 5;
/// BNB Smart Chain
pub const CHAIN_ID_BSC: u64 = 56;
/// BNB Smart Chain testnet
pub const CHAIN_ID_BSC_TESTNET: u64 = 97;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Polygon Mumbai testnet
pub const CHAIN_ID_MUMBAI: u64 = 80001;

/// All chains with a built-in NetworkProfile
pub const SUPPORTED_CHAIN_IDS: [u64; 6] = [
    CHAIN_ID_ETHEREUM,
    CHAIN_ID_GOERLI,
    CHAIN_ID_BSC,
    CHAIN_ID_BSC_TESTNET,
    CHAIN_ID_POLYGON,
    CHAIN_ID_MUMBAI,
];

// ============================================
// DEFAULT RPC ENDPOINTS (ordered fallback lists)
// ============================================

/// Ordered public RPC endpoints for a chain. First entry is tried first.
pub fn default_rpc_urls(chain_id: u64) -> &'static [&'static str] {
    match chain_id {
        CHAIN_ID_ETHEREUM => &[
            "https://eth.drpc.org",
            "https://ethereum.publicnode.com",
            "https://cloudflare-eth.com",
            "https://eth-mainnet.public.blastapi.io",
        ],
        CHAIN_ID_GOERLI => &[
            "https://ethereum-goerli.publicnode.com",
            "https://goerli.gateway.tenderly.co",
        ],
        CHAIN_ID_BSC => &[
            "https://bsc-dataseed.binance.org",
            "https://bsc-dataseed1.defibit.io",
            "https://bsc-dataseed1.ninicoin.io",
            "https://bsc.publicnode.com",
        ],
        CHAIN_ID_BSC_TESTNET => &[
            "https://data-seed-prebsc-1-s1.binance.org:8545",
            "https://data-seed-prebsc-2-s1.binance.org:8545",
            "https://bsc-testnet.publicnode.com",
        ],
        CHAIN_ID_POLYGON => &[
            "https://polygon-rpc.com",
            "https://polygon.drpc.org",
            "https://polygon-bor.publicnode.com",
            "https://polygon.gateway.tenderly.co",
        ],
        CHAIN_ID_MUMBAI => &[
            "https://rpc-mumbai.maticvigil.com",
            "https://polygon-mumbai.gateway.tenderly.co",
            "https://polygon-mumbai.blockpi.network/v1/rpc/public",
        ],
        _ => &[],
    }
}

// ============================================
// CHAIN METADATA
// ============================================

/// Get chain display name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum Mainnet",
        CHAIN_ID_GOERLI => "Ethereum Goerli",
        CHAIN_ID_BSC => "BSC Mainnet",
        CHAIN_ID_BSC_TESTNET => "BSC Testnet",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_MUMBAI => "Mumbai (Polygon Testnet)",
        _ => "Unknown",
    }
}

/// Get native token symbol
pub fn get_native_symbol(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "ETH",
        CHAIN_ID_GOERLI => "gETH",
        CHAIN_ID_BSC => "BNB",
        CHAIN_ID_BSC_TESTNET => "tBNB",
        CHAIN_ID_POLYGON => "MATIC",
        CHAIN_ID_MUMBAI => "tMATIC",
        _ => "ETH",
    }
}

/// Get block explorer URL
pub fn get_explorer_url(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "https://etherscan.io",
        CHAIN_ID_GOERLI => "https://goerli.etherscan.io",
        CHAIN_ID_BSC => "https://bscscan.com",
        CHAIN_ID_BSC_TESTNET => "https://testnet.bscscan.com",
        CHAIN_ID_POLYGON => "https://polygonscan.com",
        CHAIN_ID_MUMBAI => "https://mumbai.polygonscan.com",
        _ => "https://etherscan.io",
    }
}

pub fn is_testnet(chain_id: u64) -> bool {
    matches!(chain_id, CHAIN_ID_GOERLI | CHAIN_ID_BSC_TESTNET | CHAIN_ID_MUMBAI)
}

/// Check if chain ID has a built-in profile
#[inline]
pub fn is_chain_supported(chain_id: u64) -> bool {
    SUPPORTED_CHAIN_IDS.contains(&chain_id)
}

/// Env var holding a comma-separated override of a chain's endpoint list
pub fn rpc_urls_env_key(chain_id: u64) -> String {
    format!("SENTINEL_RPC_URLS_{}", chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_support() {
        assert!(is_chain_supported(1));
        assert!(is_chain_supported(80001));
        assert!(!is_chain_supported(999));
    }

    #[test]
    fn test_every_supported_chain_has_endpoints() {
        for chain_id in SUPPORTED_CHAIN_IDS {
            assert!(!default_rpc_urls(chain_id).is_empty(), "chain {}", chain_id);
            assert_ne!(get_chain_name(chain_id), "Unknown");
        }
        assert!(default_rpc_urls(999).is_empty());
    }

    #[test]
    fn test_testnet_flags() {
        assert!(is_testnet(CHAIN_ID_MUMBAI));
        assert!(!is_testnet(CHAIN_ID_POLYGON));
    }

    #[test]
    fn test_env_key() {
        assert_eq!(rpc_urls_env_key(56), "SENTINEL_RPC_URLS_56");
    }
}
