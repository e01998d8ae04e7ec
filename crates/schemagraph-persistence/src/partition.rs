//! Data partitions

use crate::error::Result;
use crate::types::{DataPartition, PartitionArguments};
use crate::utils::{apply_properties, expect_kind, parse, property, trait_list, traits_to_data};
use schemagraph_model::{CopyOptions, Corpus, DataPartitionDef, Node, NodeId, NodeKind, ResolveOptions, TraitProperty};
use serde_json::Value;

const PARTITION_PROPERTIES: [TraitProperty; 1] = [TraitProperty::Description];

/// Build a partition; one without a name is skipped. Both the keyed argument map and the older list of
/// `{name, value}` pairs are accepted; the keyed map is always written.
pub fn from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<DataPartition>(value, "data partition") else {
        return Ok(None);
    };

    let mut def = DataPartitionDef::new(data.name.unwrap_or_default());
    def.explanation = data.explanation;
    def.location = data.location;
    def.specialized_schema = data.specialized_schema;
    def.refresh_time = data.refresh_time;
    def.last_file_status_check_time = data.last_file_status_check_time;
    def.last_file_modified_time = data.last_file_modified_time;
    def.last_child_file_modified_time = data.last_child_file_modified_time;
    match data.arguments {
        Some(PartitionArguments::Map(arguments)) => def.arguments = arguments,
        Some(PartitionArguments::Legacy(arguments)) => {
            for argument in arguments {
                def.add_argument(argument.name, argument.value);
            }
        }
        None => {}
    }
    if !def.validate() {
        tracing::warn!(location = ?def.location, "skipping data partition without a name");
        return Ok(None);
    }
    if def.location.is_none() {
        tracing::warn!(partition = %def.name, "data partition has no location");
    }
    def.exhibits_traits = trait_list(corpus, data.exhibits_traits.as_ref())?;

    let id = corpus.make_object(NodeKind::DataPartition(def));
    apply_properties(corpus, id, &[(TraitProperty::Description, data.description.as_deref())])?;
    Ok(Some(id))
}

pub fn to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let partition = expect_kind(corpus, id, Node::as_partition, "data partition")?;
    let data = DataPartition {
        name: (!partition.name.is_empty()).then(|| partition.name.clone()),
        explanation: partition.explanation.clone(),
        description: property(corpus, id, TraitProperty::Description)?,
        location: partition.location.clone(),
        exhibits_traits: traits_to_data(corpus, &partition.exhibits_traits, &PARTITION_PROPERTIES, res_opt, options)?,
        arguments: (!partition.arguments.is_empty()).then(|| PartitionArguments::Map(partition.arguments.clone())),
        specialized_schema: partition.specialized_schema.clone(),
        last_file_status_check_time: partition.last_file_status_check_time,
        last_file_modified_time: partition.last_file_modified_time,
        last_child_file_modified_time: partition.last_child_file_modified_time,
        refresh_time: partition.refresh_time,
    };
    Ok(serde_json::to_value(data)?)
}
