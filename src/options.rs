//! Engine options as exposed over UCI.
//!
//! The driver owns one of these, applies `setoption` between searches and
//! hands a copy to each search. Feature toggles map one-to-one onto the
//! pruning and extension blocks in the search.

use crate::board::Variant;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Transposition table size in MB, clamped to a power of two by the
    /// table itself.
    pub hash_mb: usize,
    pub ponder: bool,
    pub own_book: bool,
    pub book_file: String,
    pub wild: Variant,
    pub null_move: bool,
    pub null_verify: bool,
    pub null_adaptive_depth: bool,
    pub null_adaptive_value: bool,
    pub alpha_pruning: bool,
    pub beta_pruning: bool,
    pub lmr: bool,
    pub futility_pruning: bool,
    pub late_move_pruning: bool,
    pub pv_extensions: bool,
    /// Multipliers over 256 for the two king-attack components.
    pub king_attack_shelter: i32,
    pub king_attack_pieces: i32,
    pub analyse_mode: bool,
    pub chess960: bool,
    pub opponent: String,
}

pub const HASH_MB_MIN: usize = 1;
pub const HASH_MB_MAX: usize = 1024;
pub const KING_ATTACK_MAX: i32 = 512;

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_mb: 128,
            ponder: false,
            own_book: true,
            book_file: "book.bin".to_string(),
            wild: Variant::Standard,
            null_move: true,
            null_verify: true,
            null_adaptive_depth: true,
            null_adaptive_value: true,
            alpha_pruning: true,
            beta_pruning: true,
            lmr: true,
            futility_pruning: true,
            late_move_pruning: true,
            pv_extensions: true,
            king_attack_shelter: 256,
            king_attack_pieces: 256,
            analyse_mode: false,
            chess960: false,
            opponent: String::new(),
        }
    }
}

impl EngineOptions {
    /// Apply a `setoption` pair. Unknown names report an error string for
    /// the driver to surface; values are clamped into range.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), String> {
        let truthy = value.eq_ignore_ascii_case("true") || value == "1";
        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let mb: usize = value.parse().map_err(|_| format!("bad Hash value '{value}'"))?;
                self.hash_mb = mb.clamp(HASH_MB_MIN, HASH_MB_MAX);
            }
            "ponder" => self.ponder = truthy,
            "ownbook" => self.own_book = truthy,
            "bookfile" => self.book_file = value.to_string(),
            "wild" => {
                self.wild = match value.to_ascii_lowercase().as_str() {
                    "standard" => Variant::Standard,
                    "losers" | "17" => Variant::Losers,
                    other => return Err(format!("unknown Wild value '{other}'")),
                }
            }
            "nullmove" => self.null_move = truthy,
            "nullverify" => self.null_verify = truthy,
            "nulladaptivedepth" => self.null_adaptive_depth = truthy,
            "nulladaptivevalue" => self.null_adaptive_value = truthy,
            "alphapruning" => self.alpha_pruning = truthy,
            "betapruning" => self.beta_pruning = truthy,
            "lmr" => self.lmr = truthy,
            "futilitypruning" => self.futility_pruning = truthy,
            "latemovepruning" => self.late_move_pruning = truthy,
            "pvextensions" => self.pv_extensions = truthy,
            "kingattackshelter" => {
                let v: i32 = value.parse().map_err(|_| "bad multiplier")?;
                self.king_attack_shelter = v.clamp(0, KING_ATTACK_MAX);
            }
            "kingattackpieces" => {
                let v: i32 = value.parse().map_err(|_| "bad multiplier")?;
                self.king_attack_pieces = v.clamp(0, KING_ATTACK_MAX);
            }
            "uci_analysemode" => self.analyse_mode = truthy,
            "uci_chess960" => self.chess960 = truthy,
            "uci_opponent" => self.opponent = value.to_string(),
            other => return Err(format!("unknown option '{other}'")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clamp() {
        let mut opts = EngineOptions::default();
        opts.set("Hash", "4096").unwrap();
        assert_eq!(opts.hash_mb, HASH_MB_MAX);
        opts.set("NullMove", "false").unwrap();
        assert!(!opts.null_move);
        opts.set("Wild", "losers").unwrap();
        assert_eq!(opts.wild, Variant::Losers);
        opts.set("KingAttackShelter", "9999").unwrap();
        assert_eq!(opts.king_attack_shelter, KING_ATTACK_MAX);
        assert!(opts.set("NoSuchOption", "1").is_err());
    }
}
