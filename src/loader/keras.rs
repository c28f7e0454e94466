//! Keras HDF5 weights
//!
//! `TFBertForSequenceClassification.save_weights` writes one group per
//! layer, each variable stored under its full TF name, e.g.
//! `/bert/tf_bert_for_sequence_classification/bert/encoder/layer_._0/attention/self/query/kernel:0`.
//! Variables are renamed to the PyTorch layout candle expects, with dense
//! kernels transposed from `(in, out)` to `(out, in)`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};

/// Name scope Keras gives the model in HuggingFace TF checkpoints
const MODEL_SCOPE_PREFIX: &str = "tf_bert";

fn h5_error(e: hdf5::Error) -> anyhow::Error {
    anyhow!("HDF5 error: {}", e)
}

/// Read every model variable of a Keras checkpoint
///
/// Datasets that are not model variables (optimizer slots, step counters)
/// are skipped. Tensors are returned as f32 on the CPU.
pub fn load_tensors(path: &Path) -> Result<HashMap<String, Tensor>> {
    let file = hdf5::File::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;

    let mut datasets = Vec::new();
    collect_datasets(&file, &mut datasets)?;

    let mut tensors = HashMap::with_capacity(datasets.len());
    for dataset in datasets {
        let h5_name = dataset.name();
        let Some((name, transpose)) = torch_name(&h5_name) else {
            tracing::debug!("Skipping {}", h5_name);
            continue;
        };

        let data: Vec<f32> = dataset.read_raw().map_err(h5_error)?;
        let mut tensor = Tensor::from_vec(data, dataset.shape(), &Device::Cpu)?;
        if transpose && tensor.rank() == 2 {
            tensor = tensor.t()?.contiguous()?;
        }
        tracing::trace!("{} -> {} {:?}", h5_name, name, tensor.dims());
        tensors.insert(name, tensor);
    }

    if tensors.is_empty() {
        return Err(anyhow!(
            "No model variables found in Keras checkpoint {}",
            path.display()
        ));
    }
    tracing::debug!("Read {} variables from {}", tensors.len(), path.display());
    Ok(tensors)
}

fn collect_datasets(group: &hdf5::Group, out: &mut Vec<hdf5::Dataset>) -> Result<()> {
    out.extend(group.datasets().map_err(h5_error)?);
    for child in group.groups().map_err(h5_error)? {
        collect_datasets(&child, out)?;
    }
    Ok(())
}

/// Map a TF variable path to its PyTorch name
///
/// Returns the name and whether the tensor must be transposed, or `None`
/// for datasets that are not model variables.
pub fn torch_name(h5_path: &str) -> Option<(String, bool)> {
    let segments: Vec<&str> = h5_path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // Everything up to the model scope is the Keras layer group.
    let start = segments
        .iter()
        .position(|s| s.starts_with(MODEL_SCOPE_PREFIX))
        .map_or(1, |i| i + 1);
    let (leaf, parents) = segments.get(start..)?.split_last()?;
    if parents.is_empty() {
        return None;
    }

    let leaf = leaf.split(':').next().unwrap_or(*leaf);
    let (leaf, transpose) = match leaf {
        "kernel" => ("weight", true),
        "gamma" | "embeddings" | "weight" => ("weight", false),
        "beta" | "bias" => ("bias", false),
        _ => return None,
    };

    let mut name: Vec<String> = parents
        .iter()
        .map(|s| match s.strip_prefix("layer_._") {
            Some(index) => format!("layer.{}", index),
            None => s.to_string(),
        })
        .collect();
    name.push(leaf.to_string());
    Some((name.join("."), transpose))
}

/// Write `tensors` (PyTorch names, `bert.` prefixed) as a Keras checkpoint
#[cfg(test)]
pub(crate) fn write_checkpoint(path: &Path, tensors: &HashMap<String, Tensor>) -> Result<()> {
    let file = hdf5::File::create(path).map_err(h5_error)?;

    for (name, tensor) in tensors {
        let (group_path, leaf, transpose) = keras_path(name);
        let mut group = file.group("/").map_err(h5_error)?;
        for segment in group_path.split('/') {
            group = if group.link_exists(segment) {
                group.group(segment).map_err(h5_error)?
            } else {
                group.create_group(segment).map_err(h5_error)?
            };
        }

        let tensor = if transpose {
            tensor.t()?.contiguous()?
        } else {
            tensor.clone()
        };
        let data = tensor.flatten_all()?.to_vec1::<f32>()?;
        let dataset = group
            .new_dataset::<f32>()
            .shape(tensor.dims().to_vec())
            .create(leaf.as_str())
            .map_err(h5_error)?;
        dataset.write_raw(data.as_slice()).map_err(h5_error)?;
    }
    Ok(())
}

#[cfg(test)]
fn keras_path(name: &str) -> (String, String, bool) {
    let parts: Vec<&str> = name.split('.').collect();
    let (leaf, parents) = parts.split_last().expect("empty tensor name");
    let parent = parents.last().copied().unwrap_or("");

    let (leaf, transpose) = match (parent, *leaf) {
        ("LayerNorm", "weight") => ("gamma", false),
        ("LayerNorm", "bias") => ("beta", false),
        ("word_embeddings", "weight") => ("weight", false),
        (p, "weight") if p.ends_with("_embeddings") => ("embeddings", false),
        (_, "weight") => ("kernel", true),
        (_, other) => (other, false),
    };

    let mut scoped = Vec::new();
    let mut iter = parents.iter().peekable();
    while let Some(part) = iter.next() {
        match iter.peek() {
            Some(index) if *part == "layer" && index.parse::<usize>().is_ok() => {
                scoped.push(format!("layer_._{}", index));
                iter.next();
            }
            _ => scoped.push(part.to_string()),
        }
    }

    let group = format!(
        "{}/tf_bert_for_sequence_classification/{}",
        parents[0],
        scoped.join("/")
    );
    (group, format!("{}:0", leaf), transpose)
}
