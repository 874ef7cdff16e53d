//! Cross-module tests: tower properties checked against a `BigInt` oracle
//! and whole-program scenarios over the context chain.
