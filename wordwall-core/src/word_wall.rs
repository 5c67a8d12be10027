//! The four script properties a word wall carries, and copying them from
//! one wall to another.

use crate::host::Host;
use crate::ids::GlobalId;
use crate::{PatcherError, Result};

pub const SCRIPT_PATH: &str = "VMAD\\Scripts\\[0]";
pub const VALUE_PATH_V1: &str = "Value\\Object Union\\Object v1\\FormID";
pub const VALUE_PATH_V2: &str = "Value\\Object Union\\Object v2\\FormID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWallField {
    Word1,
    Word2,
    Word3,
    Shout,
}

impl WordWallField {
    /// Copy order.
    pub const ALL: [WordWallField; 4] = [
        WordWallField::Word1,
        WordWallField::Word2,
        WordWallField::Word3,
        WordWallField::Shout,
    ];

    pub fn property_name(self) -> &'static str {
        match self {
            WordWallField::Word1 => "myWord01",
            WordWallField::Word2 => "myWord02",
            WordWallField::Word3 => "myWord03",
            WordWallField::Shout => "shoutGlobal",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// View of one word wall override. Built fresh for every use, since
/// patching another wall can change what the host would return.
#[derive(Debug, Clone)]
pub struct WordWall<H> {
    pub handle: H,
    pub form_id: GlobalId,
    pub cell_name: String,
    values: [H; 4],
}

impl<H: Clone> WordWall<H> {
    pub fn materialize<T>(host: &T, handle: &H) -> Result<Self>
    where
        T: Host<Handle = H>,
    {
        let form_id = GlobalId::from_hex(&host.hex_form_id(handle));
        let shape_error = |reason: String| PatcherError::Shape {
            form_id: form_id.to_string(),
            reason,
        };

        let script = host
            .element(handle, SCRIPT_PATH)
            .ok_or_else(|| shape_error(" does not have a script.".to_string()))?;

        let mut properties = Vec::with_capacity(WordWallField::ALL.len());
        for field in WordWallField::ALL {
            let property = host
                .script_property(&script, field.property_name())
                .ok_or_else(|| {
                    shape_error(format!(
                        "'s script does not have a {} property.",
                        field.property_name()
                    ))
                })?;
            properties.push((field, property));
        }

        let mut values = Vec::with_capacity(properties.len());
        for (field, property) in properties {
            let value = object_value(host, &property).ok_or_else(|| {
                shape_error(format!(
                    "'s {} property has no object value.",
                    field.property_name()
                ))
            })?;
            values.push(value);
        }
        let values: [H; 4] = values
            .try_into()
            .map_err(|_| shape_error(" has an incomplete script.".to_string()))?;

        let cell_name = host.cell_name(handle).unwrap_or_default();

        Ok(Self {
            handle: handle.clone(),
            form_id,
            cell_name,
            values,
        })
    }

    pub fn value(&self, field: WordWallField) -> &H {
        &self.values[field.index()]
    }
}

/// Older records keep object properties under the v1 union member, newer
/// ones under v2.
fn object_value<T: Host>(host: &T, property: &T::Handle) -> Option<T::Handle> {
    host.element(property, VALUE_PATH_V1)
        .or_else(|| host.element(property, VALUE_PATH_V2))
}

/// Overwrites all four values of `target` with those of `source`, in
/// [`WordWallField::ALL`] order. A host failure part way leaves the
/// earlier fields written.
pub fn patch<T: Host>(
    host: &mut T,
    target: &WordWall<T::Handle>,
    source: &WordWall<T::Handle>,
) -> Result<()> {
    for field in WordWallField::ALL {
        host.copy_element(target.value(field), source.value(field))?;
    }
    Ok(())
}
