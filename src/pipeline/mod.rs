pub mod diagnostic; // Diagnostic bundle dump (auto in dev, MEDCIPHER_DUMP_DIR in prod)
pub mod prescription;
