//! A sample Majority Judgment election run end to end in process.
//!
//! Simulated voters grade every candidate, encrypt their one-hot ballot
//! matrices under the election public key, and push them through the same
//! wire codec a networked client would use before the tally server
//! accumulates them and resolves the winner.
use paillier_voting::{wire, Aggregator, BigInt, Ciphertext, KeyPair};
use rand::Rng;

const PRIME_BITS: usize = 16;
const CANDIDATES: usize = 5;
const GRADES: usize = 5;
const VOTERS: usize = 7;

fn main() {
    let keys = KeyPair::keygen(PRIME_BITS).expect("key generation failed");
    let pk = keys.get_pk();
    println!("public key payload:\n{}", wire::encode_public_key(pk));

    let names: Vec<String> = (1..=CANDIDATES).map(|i| format!("candidate {}", i)).collect();
    println!("ballot for:\n{}", wire::encode_names(&names));

    let mut aggregator =
        Aggregator::new(keys, CANDIDATES, GRADES).expect("failed to initialize the tally");

    let mut rng = rand::thread_rng();
    for voter in 0..VOTERS {
        // one grade per candidate, one-hot per row
        let mut ballot = Vec::with_capacity(CANDIDATES);
        for _ in 0..CANDIDATES {
            let grade = rng.gen_range(0..GRADES);
            let row: Vec<Ciphertext> = (0..GRADES)
                .map(|j| {
                    let bit = if j == grade { BigInt::ONE } else { BigInt::ZERO };
                    Ciphertext::encrypt(&bit, pk).expect("encryption failed")
                })
                .collect();
            ballot.push(row);
        }

        // round-trip through the wire codec, as the transport would
        let payload = wire::encode_matrix(&ballot);
        let received =
            wire::parse_matrix(&payload, CANDIDATES, GRADES).expect("ballot payload rejected");
        aggregator.add_vote(&received).expect("ballot rejected");
        println!("voter {} cast a ballot ({})", voter + 1, wire::SUCCESS);
    }

    let winner = aggregator.aggregate().expect("aggregation failed");
    println!("election winner: {}", names[winner]);
}
