/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod in_memory;

use crate::in_memory::InMemoryAggregate;
use callback_stream::{AggregateObservable, BridgeConfig, BridgeError, Operation, StreamAdapter};
use clap::Parser;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command()]
struct BridgeArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
    /// JSON array of documents to aggregate over.
    #[arg(short, long, value_name = "FILE")]
    data: Option<String>,
    /// JSON object; documents must carry every field with an equal value.
    #[arg(short, long, default_value = "{}")]
    filter: String,
}

fn load_documents(path: Option<&str>) -> Result<Vec<Value>, BridgeError> {
    let Some(path) = path else {
        return Ok((1..=5)
            .map(|n| json!({ "order": n, "status": if n % 2 == 0 { "pending" } else { "shipped" } }))
            .collect());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|err| BridgeError::Config(format!("{path}: {err}")))?;
    serde_json::from_str(&contents).map_err(|err| BridgeError::Config(format!("{path}: {err}")))
}

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started configurable-bridge");

    let args = BridgeArgs::parse();
    let config = BridgeConfig::load(&args.config)?;
    let documents = load_documents(args.data.as_deref())?;
    let filter: Value = serde_json::from_str(&args.filter)
        .map_err(|err| BridgeError::configuration("filter", err.to_string()))?;

    let adapter = StreamAdapter::from_config(&config.delivery)?;
    let executor = Arc::new(InMemoryAggregate::new(documents, filter));
    let mut aggregate = AggregateObservable::new(Operation::new(executor.clone()), adapter);
    aggregate.apply_defaults(&config.aggregate)?;

    let mut items = aggregate.to_item_stream().to_stream();
    let mut count = 0usize;
    while let Some(item) = items.next().await {
        match item {
            Ok(document) => {
                count += 1;
                println!("{document}");
            }
            Err(err) => {
                error!(err = %err, "aggregate stream failed");
                return Err(err);
            }
        }
    }
    info!(count, "aggregate stream complete");

    aggregate.to_collection().single().await?;
    info!(written = executor.output_len(), "aggregate output written");

    Ok(())
}
