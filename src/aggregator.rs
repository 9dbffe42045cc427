//! Accumulates encrypted ballots and resolves the Majority Judgment winner
use crate::cipher::Ciphertext;
use crate::error::{Error, Result};
use crate::gates;
use crate::keys::KeyPair;
use crate::BigInt;
use log::debug;

/// Whether a tie-break test keeps the incumbent winner or replaces it with
/// the challenger.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum Verdict {
    Keep,
    Replace,
}

/// The decrypted outcomes of the greater-than comparisons between the two
/// tiebreak values of an incumbent winner and a challenger. Each candidate
/// carries a weighted vote count above its median cut (`upper`) and one
/// below it (`lower`).
#[derive(Debug, Copy, Clone)]
struct TiebreakComparison {
    /// winner's upper weight exceeds its lower weight
    winner_top_heavy: bool,
    /// challenger's upper weight exceeds its lower weight
    challenger_top_heavy: bool,
    /// winner's upper weight exceeds the challenger's
    winner_upper_exceeds: bool,
    /// challenger's upper weight exceeds the winner's
    challenger_upper_exceeds: bool,
    /// challenger's lower weight exceeds the winner's
    challenger_lower_exceeds: bool,
}

impl TiebreakComparison {
    /// Exactly one side has more weight above its cut than below.
    fn single_top_heavy(&self) -> Option<Verdict> {
        match (self.winner_top_heavy, self.challenger_top_heavy) {
            (true, false) => Some(Verdict::Keep),
            (false, true) => Some(Verdict::Replace),
            _ => None,
        }
    }

    /// Both sides are top-heavy; the larger upper weight wins.
    fn both_top_heavy(&self) -> Option<Verdict> {
        if !(self.winner_top_heavy && self.challenger_top_heavy) {
            return None;
        }
        if self.winner_upper_exceeds {
            return Some(Verdict::Keep);
        }
        if self.challenger_upper_exceeds {
            return Some(Verdict::Replace);
        }
        return None;
    }

    /// Neither side is top-heavy; the challenger only wins with strictly
    /// more weight below its cut.
    fn neither_top_heavy(&self) -> Option<Verdict> {
        if self.winner_top_heavy || self.challenger_top_heavy {
            return None;
        }
        if self.challenger_lower_exceeds {
            return Some(Verdict::Replace);
        }
        return None;
    }
}

/// The ordered tie-break cascade; the first discriminating test wins, and a
/// full fall-through keeps the incumbent.
const TIEBREAK_TESTS: [fn(&TiebreakComparison) -> Option<Verdict>; 3] = [
    TiebreakComparison::single_top_heavy,
    TiebreakComparison::both_top_heavy,
    TiebreakComparison::neither_top_heavy,
];

/// Owns the running encrypted tally of one election.
///
/// Rows are candidates, columns are grade levels (column 0 is the best
/// grade). Each cell holds an encryption of the number of ballots that gave
/// that candidate that grade. Ballot rows are expected to be one-hot; that
/// precondition is enforced by the ballot producer, not here.
///
/// Calls to [`Aggregator::add_vote`] must be serialized with respect to each
/// other and to [`Aggregator::aggregate`]; the cell update sequence is not
/// atomic and has no isolation guarantee.
pub struct Aggregator {
    keys: KeyPair,
    tally: Vec<Vec<Ciphertext>>,
    rows: usize,
    cols: usize,
}

impl Aggregator {
    /// Create an aggregator for `rows` candidates and `cols` grade levels,
    /// with every tally cell initialized to an encryption of zero.
    pub fn new(keys: KeyPair, rows: usize, cols: usize) -> Result<Self> {
        let pk = keys.get_pk();
        let mut tally = Vec::with_capacity(rows);
        for _ in 0..rows {
            let mut row = Vec::with_capacity(cols);
            for _ in 0..cols {
                row.push(Ciphertext::encrypt(&BigInt::ZERO, pk)?);
            }
            tally.push(row);
        }
        return Ok(Self {
            keys,
            tally,
            rows,
            cols,
        });
    }

    pub fn get_tally(&self) -> &[Vec<Ciphertext>] {
        &self.tally
    }

    /// Accumulate one encrypted ballot matrix into the tally.
    ///
    /// The updated matrix is computed in full before being committed, so a
    /// failing cell leaves the tally at its pre-call value.
    pub fn add_vote(&mut self, ballot: &[Vec<Ciphertext>]) -> Result<()> {
        if ballot.len() != self.rows || ballot.iter().any(|row| row.len() != self.cols) {
            return Err(Error::ShapeMismatch {
                rows: self.rows,
                cols: self.cols,
                got_rows: ballot.len(),
                got_cols: ballot.first().map(|row| row.len()).unwrap_or(0),
            });
        }

        let pk = self.keys.get_pk();
        let mut next = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let mut row = Vec::with_capacity(self.cols);
            for j in 0..self.cols {
                let mut x = gates::bit_extraction_gate(&self.tally[i][j], &self.keys)?;
                let vote = self.keys.decrypt(&ballot[i][j])?;
                let mut y = gates::convert_to_bit_array(&vote);
                gates::prepare_different_arrays(&mut x, &mut y, pk)?;
                let sum = gates::addition_gate(&x, &y, &self.keys)?;
                row.push(gates::to_number(&sum, pk.get_n(), &self.keys)?);
            }
            next.push(row);
        }

        self.tally = next;
        debug!("ballot accumulated into {}x{} tally", self.rows, self.cols);
        return Ok(());
    }

    /// Resolve the election winner from the current tally and return its
    /// candidate index. The tally itself is left untouched.
    ///
    /// An empty tally resolves deterministically to index 0.
    pub fn aggregate(&self) -> Result<usize> {
        let c = self.candidate_matrix()?;
        debug!("candidate matrix computed");
        let g = self.grade_vector(&c)?;
        debug!("grade vector computed");
        let t = self.tiebreak_matrix(&g)?;
        debug!("tiebreak matrix computed");

        let mut winner = 0;
        for challenger in 1..self.rows {
            winner = self.get_better_candidate(winner, challenger, &c, &t)?;
        }
        debug!("winner resolved: candidate {}", winner);
        return Ok(winner);
    }

    /// Homomorphic sum of a slice of tally cells.
    fn array_sum(&self, cells: &[Ciphertext]) -> Result<Ciphertext> {
        let pk = self.keys.get_pk();
        let mut total = Ciphertext::encrypt(&BigInt::ZERO, pk)?;
        for cell in cells {
            total = total.hom_add(cell, pk);
        }
        return Ok(total);
    }

    /// Phase one: `c[i][j]` holds an encrypted 1 iff candidate `i`'s share
    /// of grades up to (excluding) `j` is not yet a strict majority of the
    /// row total, i.e. the candidate's median grade lies at or beyond `j`.
    ///
    /// The strict majority test `prefix > total / 2` is run as
    /// `total > 2 * prefix` to stay in integer arithmetic.
    fn candidate_matrix(&self) -> Result<Vec<Vec<Ciphertext>>> {
        let pk = self.keys.get_pk();
        let mut c = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let total = self.array_sum(&self.tally[i])?;
            let total_bits = gates::bit_extraction_gate(&total, &self.keys)?;

            let mut row = Vec::with_capacity(self.cols);
            for j in 0..self.cols {
                let prefix = self.array_sum(&self.tally[i][..j])?;
                let doubled = prefix.hom_add(&prefix, pk);

                let mut left = gates::bit_extraction_gate(&doubled, &self.keys)?;
                let mut right = total_bits.clone();
                gates::prepare_similar_arrays(&mut right, &mut left, pk)?;
                row.push(gates::greater_than_gate(&right, &left, &self.keys)?);
            }
            c.push(row);
        }
        return Ok(c);
    }

    /// Phase two: `g[j]` holds an encrypted 1 iff every candidate still has
    /// a 1 in column `j` of the candidate matrix, i.e. no candidate's
    /// median cut has been reached yet.
    fn grade_vector(&self, c: &[Vec<Ciphertext>]) -> Result<Vec<Ciphertext>> {
        let pk = self.keys.get_pk();
        let mut g = Vec::with_capacity(self.cols);
        for j in 0..self.cols {
            let mut running = Ciphertext::encrypt(&BigInt::ONE, pk)?;
            for row in c.iter() {
                running = gates::conditional_gate(&running, &row[j], &self.keys)?;
            }
            g.push(running);
        }
        return Ok(g);
    }

    /// Phase three: per candidate, two weighted sums over the tally row.
    /// The first weighs cells by the grade vector (grades above the common
    /// median cut), the second by the complemented grade vector shifted one
    /// column (grades below it).
    fn tiebreak_matrix(&self, g: &[Ciphertext]) -> Result<Vec<[Ciphertext; 2]>> {
        let pk = self.keys.get_pk();
        let one = Ciphertext::encrypt(&BigInt::ONE, pk)?;

        let mut t = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let mut upper = Ciphertext::encrypt(&BigInt::ZERO, pk)?;
            for j in 0..self.cols {
                let picked = gates::conditional_gate(&self.tally[i][j], &g[j], &self.keys)?;
                upper = upper.hom_add(&picked, pk);
            }

            let mut lower = Ciphertext::encrypt(&BigInt::ZERO, pk)?;
            for j in 1..self.cols {
                let complement = one.hom_sub(&g[j - 1], pk)?;
                let picked = gates::conditional_gate(&self.tally[i][j], &complement, &self.keys)?;
                lower = lower.hom_add(&picked, pk);
            }

            t.push([upper, lower]);
        }
        return Ok(t);
    }

    /// The first column at which the candidate's majority predicate fails,
    /// falling back to the last column when it never does. A lower index
    /// means a better median grade band.
    fn median_cut_index(&self, candidate: usize, c: &[Vec<Ciphertext>]) -> Result<usize> {
        for (j, cell) in c[candidate].iter().enumerate() {
            if self.keys.decrypt(cell)? == BigInt::ZERO {
                return Ok(j);
            }
        }
        return Ok(self.cols - 1);
    }

    /// Decrypted strictly-greater comparison of two equally padded
    /// encrypted bit vectors.
    fn exceeds(&self, x: &[Ciphertext], y: &[Ciphertext]) -> Result<bool> {
        let result = gates::greater_than_gate(x, y, &self.keys)?;
        return Ok(self.keys.decrypt(&result)? == BigInt::ONE);
    }

    /// Phase four comparator: the candidate with the lower median cut wins
    /// outright; on a tie the cascade of tie-break tests runs over the four
    /// tiebreak values, and a full fall-through keeps the incumbent.
    fn get_better_candidate(
        &self,
        winner: usize,
        challenger: usize,
        c: &[Vec<Ciphertext>],
        t: &[[Ciphertext; 2]],
    ) -> Result<usize> {
        let winner_cut = self.median_cut_index(winner, c)?;
        let challenger_cut = self.median_cut_index(challenger, c)?;
        if winner_cut < challenger_cut {
            return Ok(winner);
        }
        if challenger_cut < winner_cut {
            return Ok(challenger);
        }

        let pk = self.keys.get_pk();
        let mut w_upper = gates::bit_extraction_gate(&t[winner][0], &self.keys)?;
        let mut w_lower = gates::bit_extraction_gate(&t[winner][1], &self.keys)?;
        let mut c_upper = gates::bit_extraction_gate(&t[challenger][0], &self.keys)?;
        let mut c_lower = gates::bit_extraction_gate(&t[challenger][1], &self.keys)?;

        // pad all four values to a common width so any pair is comparable
        let widest = [&w_upper, &w_lower, &c_upper, &c_lower]
            .iter()
            .map(|bits| bits.len())
            .max()
            .unwrap_or(0);
        for bits in [&mut w_upper, &mut w_lower, &mut c_upper, &mut c_lower] {
            while bits.len() < widest {
                bits.push(Ciphertext::encrypt(&BigInt::ZERO, pk)?);
            }
        }

        let comparison = TiebreakComparison {
            winner_top_heavy: self.exceeds(&w_upper, &w_lower)?,
            challenger_top_heavy: self.exceeds(&c_upper, &c_lower)?,
            winner_upper_exceeds: self.exceeds(&w_upper, &c_upper)?,
            challenger_upper_exceeds: self.exceeds(&c_upper, &w_upper)?,
            challenger_lower_exceeds: self.exceeds(&c_lower, &w_lower)?,
        };

        for test in TIEBREAK_TESTS {
            if let Some(verdict) = test(&comparison) {
                return Ok(match verdict {
                    Verdict::Keep => winner,
                    Verdict::Replace => challenger,
                });
            }
        }
        return Ok(winner);
    }
}
