//! Documents, manifests and whole-file loading

use crate::attribute::attribute_group_from_data;
use crate::declaration::{entity_declaration_from_data, manifest_declaration_data, manifest_declaration_from_data};
use crate::definition::{data_type_from_data, entity_from_data, purpose_from_data, trait_from_data};
use crate::error::{PersistenceError, Result};
use crate::types::{DocumentContent, Import, ManifestContent};
use crate::utils::{expect_kind, parse, trait_list, traits_to_data};
use anyhow::Context;
use schemagraph_model::{
    CopyOptions, Corpus, DocumentDef, ImportDef, ManifestDef, Node, NodeId, NodeKind, ResolveOptions,
};
use serde_json::Value;

pub const MANIFEST_EXTENSION: &str = ".manifest.cdm.json";

/// A top-level definition, recognised by its name key.
pub fn definition_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Value::Object(obj) = value else {
        return Ok(None);
    };
    if obj.contains_key("entityName") {
        entity_from_data(corpus, value)
    } else if obj.contains_key("traitName") {
        trait_from_data(corpus, value)
    } else if obj.contains_key("dataTypeName") {
        data_type_from_data(corpus, value)
    } else if obj.contains_key("purposeName") {
        purpose_from_data(corpus, value)
    } else if obj.contains_key("attributeGroupName") {
        attribute_group_from_data(corpus, value)
    } else {
        Ok(None)
    }
}

fn definitions_from_data(corpus: &mut Corpus, items: Option<&Vec<Value>>, document: &str) -> Result<Vec<NodeId>> {
    let mut definitions = Vec::new();
    for (index, item) in items.into_iter().flatten().enumerate() {
        match definition_from_data(corpus, item)? {
            Some(definition) => definitions.push(definition),
            None => tracing::warn!(index, document, "skipping definition with unrecognised shape"),
        }
    }
    Ok(definitions)
}

fn imports_from_data(imports: Option<Vec<Import>>) -> Vec<ImportDef> {
    imports
        .unwrap_or_default()
        .into_iter()
        .map(|import| ImportDef {
            corpus_path: import.corpus_path,
            moniker: import.moniker,
        })
        .collect()
}

fn imports_to_data(imports: &[ImportDef]) -> Option<Vec<Import>> {
    let imports: Vec<_> = imports
        .iter()
        .map(|import| Import {
            corpus_path: import.corpus_path.clone(),
            moniker: import.moniker.clone(),
        })
        .collect();
    (!imports.is_empty()).then_some(imports)
}

/// Build a document node named `name` inside `folder_path`.
pub fn document_from_data(corpus: &mut Corpus, folder_path: &str, name: &str, value: &Value) -> Result<NodeId> {
    let Some(content) = parse::<DocumentContent>(value, "document") else {
        return Err(PersistenceError::NotA {
            path: format!("{folder_path}{name}"),
            expected: "document",
        });
    };

    let mut document = DocumentDef::new(name, folder_path);
    document.json_schema_semantic_version = content.json_schema_semantic_version;
    document.imports = imports_from_data(content.imports);
    document.definitions = definitions_from_data(corpus, content.definitions.as_ref(), name)?;
    Ok(corpus.make_object(NodeKind::Document(document)))
}

pub fn document_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let document = expect_kind(corpus, id, Node::as_document, "document")?;
    let content = DocumentContent {
        schema: None,
        json_schema_semantic_version: document.json_schema_semantic_version.clone(),
        imports: imports_to_data(&document.imports),
        definitions: Some(crate::list_to_data(corpus, &document.definitions, res_opt, options)?),
    };
    Ok(serde_json::to_value(content)?)
}

pub fn manifest_from_data(corpus: &mut Corpus, folder_path: &str, name: &str, value: &Value) -> Result<NodeId> {
    let Some(content) = parse::<ManifestContent>(value, "manifest") else {
        return Err(PersistenceError::NotA {
            path: format!("{folder_path}{name}"),
            expected: "manifest",
        });
    };

    let mut document = DocumentDef::new(name, folder_path);
    document.json_schema_semantic_version = content.json_schema_semantic_version;
    document.imports = imports_from_data(content.imports);
    document.definitions = definitions_from_data(corpus, content.definitions.as_ref(), name)?;

    let mut manifest = ManifestDef::new(content.manifest_name, document);
    manifest.explanation = content.explanation;
    manifest.last_file_status_check_time = content.last_file_status_check_time;
    manifest.last_file_modified_time = content.last_file_modified_time;
    manifest.last_child_file_modified_time = content.last_child_file_modified_time;
    manifest.exhibits_traits = trait_list(corpus, content.exhibits_traits.as_ref())?;
    for (index, item) in content.entities.iter().flatten().enumerate() {
        match entity_declaration_from_data(corpus, item)? {
            Some(declaration) => manifest.entities.push(declaration),
            None => tracing::warn!(index, manifest = %manifest.manifest_name, "skipping unreadable entity declaration"),
        }
    }
    for declaration in content.sub_manifests.unwrap_or_default() {
        manifest.sub_manifests.push(manifest_declaration_from_data(corpus, declaration));
    }
    Ok(corpus.make_object(NodeKind::Manifest(manifest)))
}

pub fn manifest_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let manifest = expect_kind(corpus, id, Node::as_manifest, "manifest")?;
    let definitions = crate::list_to_data(corpus, &manifest.document.definitions, res_opt, options)?;
    let mut sub_manifests = Vec::with_capacity(manifest.sub_manifests.len());
    for &declaration in &manifest.sub_manifests {
        sub_manifests.push(manifest_declaration_data(corpus, declaration)?);
    }
    let content = ManifestContent {
        manifest_name: manifest.manifest_name.clone(),
        explanation: manifest.explanation.clone(),
        json_schema_semantic_version: manifest.document.json_schema_semantic_version.clone(),
        imports: imports_to_data(&manifest.document.imports),
        definitions: (!definitions.is_empty()).then_some(definitions),
        exhibits_traits: traits_to_data(corpus, &manifest.exhibits_traits, &[], res_opt, options)?,
        entities: Some(crate::list_to_data(corpus, &manifest.entities, res_opt, options)?),
        sub_manifests: (!sub_manifests.is_empty()).then_some(sub_manifests),
        last_file_status_check_time: manifest.last_file_status_check_time,
        last_file_modified_time: manifest.last_file_modified_time,
        last_child_file_modified_time: manifest.last_child_file_modified_time,
    };
    Ok(serde_json::to_value(content)?)
}

/// Parse, build and register a schema document.
pub fn load_document(corpus: &mut Corpus, folder_path: &str, name: &str, json: &str) -> anyhow::Result<NodeId> {
    let value: Value = serde_json::from_str(json).with_context(|| format!("parsing {folder_path}{name}"))?;
    let doc = document_from_data(corpus, folder_path, name, &value)?;
    corpus.register_document(doc)?;
    Ok(doc)
}

/// Parse, build and register a manifest.
pub fn load_manifest(corpus: &mut Corpus, folder_path: &str, name: &str, json: &str) -> anyhow::Result<NodeId> {
    let value: Value = serde_json::from_str(json).with_context(|| format!("parsing {folder_path}{name}"))?;
    let manifest = manifest_from_data(corpus, folder_path, name, &value)?;
    corpus.register_document(manifest)?;
    Ok(manifest)
}

/// Read `corpus_path` through the corpus storage and load it as a manifest or
/// a document, by file name.
pub async fn load_from_storage(corpus: &mut Corpus, corpus_path: &str) -> anyhow::Result<NodeId> {
    let ctx = corpus.context().clone();
    let absolute = ctx
        .storage
        .create_absolute_corpus_path(corpus_path, None)
        .with_context(|| format!("'{corpus_path}' is not a valid corpus path"))?;
    if let Some(existing) = corpus.document_by_path(&absolute) {
        return Ok(existing);
    }

    let (folder, name) = match absolute.rfind('/') {
        Some(slash) => absolute.split_at(slash + 1),
        None => ("", absolute.as_str()),
    };
    let json = ctx
        .storage
        .read(&absolute)
        .await
        .with_context(|| format!("reading {absolute}"))?;
    tracing::info!(path = %absolute, bytes = json.len(), "loaded document");

    if name.ends_with(MANIFEST_EXTENSION) {
        load_manifest(corpus, folder, name, &json)
    } else {
        load_document(corpus, folder, name, &json)
    }
}

/// Load the documents `doc` imports, transitively, so their definitions can
/// be resolved. Imports that cannot be read are logged and skipped.
pub async fn load_imports(corpus: &mut Corpus, doc: NodeId) -> anyhow::Result<()> {
    let mut pending = vec![doc];
    while let Some(current) = pending.pop() {
        let document = corpus.document(current)?;
        let folder = document.folder_path.clone();
        let imports: Vec<String> = document.imports.iter().map(|i| i.corpus_path.clone()).collect();

        for import in imports {
            let Some(absolute) = corpus.context().storage.create_absolute_corpus_path(&import, Some(&folder)) else {
                continue;
            };
            if corpus.document_by_path(&absolute).is_some() {
                continue;
            }
            match load_from_storage(corpus, &absolute).await {
                Ok(imported) => pending.push(imported),
                Err(err) => tracing::warn!(import = %absolute, error = %err, "could not load import"),
            }
        }
    }
    Ok(())
}
