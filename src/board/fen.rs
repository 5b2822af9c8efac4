//! FEN parsing and printing.

use super::piece::*;
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Variant};
use crate::bitboard::{parse_sq, sq_name};
use crate::hash::zobrist;

pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn piece_from_char(c: char) -> Option<u8> {
    Some(match c {
        'P' => WPAWN,
        'N' => WKNIGHT,
        'B' => WBISHOP,
        'R' => WROOK,
        'Q' => WQUEEN,
        'K' => WKING,
        'p' => BPAWN,
        'n' => BKNIGHT,
        'b' => BBISHOP,
        'r' => BROOK,
        'q' => BQUEEN,
        'k' => BKING,
        _ => return None,
    })
}

impl Board {
    /// Parse the six-field notation. The board is left untouched on error.
    pub fn from_fen(fen: &str) -> Result<Board, String> {
        Board::from_fen_variant(fen, Variant::Standard)
    }

    pub fn from_fen_variant(fen: &str, variant: Variant) -> Result<Board, String> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or("empty FEN")?;
        let stm = fields.next().ok_or("missing side to move")?;
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board::empty();
        board.variant = variant;

        let mut rank = 7i32;
        let mut file = 0i32;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 {
                        return Err(format!("rank {} has {} files", rank + 1, file));
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += c as i32 - '0' as i32,
                _ => {
                    let pc = piece_from_char(c).ok_or_else(|| format!("bad piece '{c}'"))?;
                    if !(0..8).contains(&file) || !(0..8).contains(&rank) {
                        return Err("placement overflows the board".to_string());
                    }
                    board.add_piece_hashed(pc, (rank * 8 + file) as u8);
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err("placement does not cover 64 squares".to_string());
        }
        if board.count(WKING) != 1 || board.count(BKING) != 1 {
            return Err("each side needs exactly one king".to_string());
        }

        let wtm = match stm {
            "w" | "W" => true,
            "b" | "B" => false,
            other => return Err(format!("bad side to move '{other}'")),
        };

        let mut rights = 0u8;
        if castling != "-" {
            for c in castling.chars() {
                rights |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(format!("bad castling flag '{other}'")),
                };
            }
            // Drop rights the piece placement cannot back up.
            use crate::bitboard::sq;
            let m = &board.matrix;
            if m[sq::E1 as usize] != WKING {
                rights &= !(CASTLE_WK | CASTLE_WQ);
            }
            if m[sq::H1 as usize] != WROOK {
                rights &= !CASTLE_WK;
            }
            if m[sq::A1 as usize] != WROOK {
                rights &= !CASTLE_WQ;
            }
            if m[sq::E8 as usize] != BKING {
                rights &= !(CASTLE_BK | CASTLE_BQ);
            }
            if m[sq::H8 as usize] != BROOK {
                rights &= !CASTLE_BK;
            }
            if m[sq::A8 as usize] != BROOK {
                rights &= !CASTLE_BQ;
            }
        }

        let ep_sq = if ep == "-" {
            0
        } else {
            parse_sq(ep).ok_or_else(|| format!("bad en-passant square '{ep}'"))?
        };

        let fifty: u16 = halfmove.parse().map_err(|_| "bad halfmove clock")?;
        let fullmove: u32 = fullmove.parse().map_err(|_| "bad fullmove number")?;

        {
            let st = board.st_mut();
            st.wtm = wtm;
            st.castling = rights;
            st.ep_sq = ep_sq;
            st.fifty = fifty;
        }
        board.root_ply = fullmove * 2 + u32::from(!wtm);

        let (hash, pawn_hash) = (board.compute_hash(), board.compute_pawn_hash());
        let st = board.st_mut();
        st.hash = hash;
        st.pawn_hash = pawn_hash;
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empties = 0;
            for file in 0..8 {
                let pc = self.matrix[rank * 8 + file];
                if pc == EMPTY {
                    empties += 1;
                } else {
                    if empties > 0 {
                        out.push((b'0' + empties) as char);
                        empties = 0;
                    }
                    out.push(SYMBOL[pc as usize]);
                }
            }
            if empties > 0 {
                out.push((b'0' + empties) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }
        let st = self.st();
        out.push_str(if st.wtm { " w " } else { " b " });
        if st.castling == 0 {
            out.push('-');
        } else {
            for (flag, c) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if st.castling & flag != 0 {
                    out.push(c);
                }
            }
        }
        out.push(' ');
        if st.ep_sq == 0 {
            out.push('-');
        } else {
            out.push_str(&sq_name(st.ep_sq));
        }
        out.push_str(&format!(" {} {}", st.fifty, self.root_ply / 2));
        out
    }

    /// Re-anchor the frame stack at ply 0, keeping the current state.
    /// Used when a new search starts from a position reached by play.
    pub fn rebase(&mut self) {
        if self.ply > 0 {
            self.stack[0] = self.stack[self.ply];
            self.ply = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::sq;

    #[test]
    fn startpos_round_trip() {
        let b = Board::new();
        assert_eq!(b.to_fen(), STARTPOS);
    }

    #[test]
    fn kiwipete_round_trip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let b = Board::from_fen(fen).unwrap();
        assert_eq!(b.to_fen(), fen);
    }

    #[test]
    fn ep_square_is_parsed() {
        let b = Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2")
            .unwrap();
        assert_eq!(b.st().ep_sq, sq::E3);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/9 w - - 0 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err()); // no kings
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
    }
}
