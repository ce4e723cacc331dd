//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions of the build controller as YAML.
//!
//! ```bash
//! # All CRDs as one multi-document stream
//! cargo run --bin crdgen > config/crd/crds.yaml
//!
//! # A single kind
//! cargo run --bin crdgen -- --kind build | kubectl apply -f -
//! ```

use build_controller::crd::{Build, Component, DeploymentTrack};
use clap::{Parser, ValueEnum};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::CustomResourceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    All,
    Component,
    DeploymentTrack,
    Build,
}

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Print build controller CRDs as YAML")]
struct Args {
    /// Which CRD to print
    #[arg(long, value_enum, default_value_t = Kind::All)]
    kind: Kind,
}

fn selected(kind: Kind) -> Vec<CustomResourceDefinition> {
    match kind {
        Kind::All => vec![Component::crd(), DeploymentTrack::crd(), Build::crd()],
        Kind::Component => vec![Component::crd()],
        Kind::DeploymentTrack => vec![DeploymentTrack::crd()],
        Kind::Build => vec![Build::crd()],
    }
}

fn main() {
    let args = Args::parse();

    let mut documents = Vec::new();
    for crd in selected(args.kind) {
        match serde_yaml::to_string(&crd) {
            Ok(yaml) => documents.push(yaml),
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("# Change the CRD types under src/crd and regenerate");
    println!("#");
    for yaml in documents {
        println!("---");
        print!("{yaml}");
    }
}
