//! # CRD Generator
//!
//! Prints every GitLab controller CRD as a multi-document YAML stream.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/gitlab.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

fn main() {
    for crd in crds::all_crds() {
        match serde_yaml::to_string(&crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
