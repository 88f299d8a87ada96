//! Collection management commands.
//!
//! Elements are inserted with `ADD-ELEMENT` (which creates the collection
//! on first insert), removed with `REMOVE-ELEMENT`; attributes are
//! mutated with `SET-ATTRIBUTES`. `CARDINALITY`, `DIMENSION` and
//! `DESCRIBE` inspect a collection.

use bytes::Bytes;

use crate::commands::{exec, lift};
use crate::enrich::parse_vector;
use crate::error::{Error, Phase, Result};
use crate::handle::VectorSetHandle;
use crate::reply::{Reply, ToArg};
use crate::transport::Transport;

/// ADD-ELEMENT — insert or overwrite one element.
///
/// Returns true when the element was newly created, false when an
/// existing element's vector was replaced.
pub async fn add_element<T: Transport + ?Sized>(
    transport: &T,
    handle: &VectorSetHandle,
    id: &str,
    vector: &[f32],
    attributes: Option<&serde_json::Value>,
) -> Result<bool> {
    if id.is_empty() {
        return Err(Error::Validation("element id must not be empty".into()));
    }
    handle.check_vector(vector)?;

    let mut args: Vec<Bytes> = Vec::with_capacity(7 + vector.len());
    args.push(Bytes::from("ADD-ELEMENT"));
    args.push(handle.name().to_arg());
    args.push(id.to_arg());
    args.push(Bytes::from("VALUES"));
    args.push(vector.len().to_arg());
    args.extend(vector.iter().map(|f| f.to_arg()));
    if let Some(attrs) = attributes {
        args.push(Bytes::from("SET-ATTRIBUTES"));
        args.push(attrs.to_string().to_arg());
    }
    args.push(Bytes::from("QUANT"));
    args.push(Bytes::from(handle.quantization().as_token()));

    let created = lift(exec(transport, args).await?.into_integer())?;
    Ok(created == 1)
}

/// REMOVE-ELEMENT — delete one element. Returns true if it existed.
pub async fn remove_element<T: Transport + ?Sized>(
    transport: &T,
    handle: &VectorSetHandle,
    id: &str,
) -> Result<bool> {
    let removed = lift(
        exec(
            transport,
            vec![Bytes::from("REMOVE-ELEMENT"), handle.name().to_arg(), id.to_arg()],
        )
        .await?
        .into_integer(),
    )?;
    Ok(removed == 1)
}

/// SET-ATTRIBUTES — replace an element's attribute set.
pub async fn set_attributes<T: Transport + ?Sized>(
    transport: &T,
    handle: &VectorSetHandle,
    id: &str,
    attributes: &serde_json::Value,
) -> Result<()> {
    exec(
        transport,
        vec![
            Bytes::from("SET-ATTRIBUTES"),
            handle.name().to_arg(),
            id.to_arg(),
            attributes.to_string().to_arg(),
        ],
    )
    .await?;
    Ok(())
}

/// ATTRIBUTES-OF — read one element's attributes.
pub async fn get_attributes<T: Transport + ?Sized>(
    transport: &T,
    handle: &VectorSetHandle,
    id: &str,
) -> Result<Option<serde_json::Value>> {
    let reply = exec(
        transport,
        vec![
            Bytes::from("ATTRIBUTES-OF"),
            handle.name().to_arg(),
            id.to_arg(),
        ],
    )
    .await?;
    match reply {
        Reply::Nil => Ok(None),
        other => Ok(other
            .as_str()
            .and_then(|text| serde_json::from_str(text).ok())),
    }
}

/// VECTOR-OF — read one element's stored vector, dequantized.
pub async fn get_vector<T: Transport + ?Sized>(
    transport: &T,
    handle: &VectorSetHandle,
    id: &str,
) -> Result<Option<Vec<f32>>> {
    let reply = exec(
        transport,
        vec![Bytes::from("VECTOR-OF"), handle.name().to_arg(), id.to_arg()],
    )
    .await?;
    if reply.is_nil() {
        return Ok(None);
    }
    Ok(parse_vector(&reply))
}

/// CARDINALITY — number of elements in the collection.
pub async fn cardinality<T: Transport + ?Sized>(transport: &T, collection: &str) -> Result<i64> {
    lift(
        exec(transport, vec![Bytes::from("CARDINALITY"), collection.to_arg()])
            .await?
            .into_integer(),
    )
}

/// DIMENSION — dimensionality of vectors in the collection.
pub async fn dimension<T: Transport + ?Sized>(transport: &T, collection: &str) -> Result<i64> {
    lift(
        exec(transport, vec![Bytes::from("DIMENSION"), collection.to_arg()])
            .await?
            .into_integer(),
    )
}

/// DESCRIBE — engine-reported facts about the collection, as
/// (field, value) pairs in reply order.
pub async fn describe<T: Transport + ?Sized>(
    transport: &T,
    collection: &str,
) -> Result<Vec<(String, Reply)>> {
    let items = lift_array(
        exec(transport, vec![Bytes::from("DESCRIBE"), collection.to_arg()]).await?,
    )?;
    let mut pairs = Vec::with_capacity(items.len() / 2);
    for chunk in items.chunks_exact(2) {
        let field = chunk[0].as_str().unwrap_or_default().to_string();
        pairs.push((field, chunk[1].clone()));
    }
    Ok(pairs)
}

fn lift_array(reply: Reply) -> Result<Vec<Reply>> {
    reply
        .into_array()
        .map_err(|e| Error::engine_unavailable(Phase::Primary, e))
}
