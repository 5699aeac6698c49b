use block_device::OffsetRead;

use crate::{
    error::{DeviceError, Error, Result},
    node::Node,
};

fn iter_path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl<'v, D> Node<'v, D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    /// Resolves a `/` separated path relative to this node.
    ///
    /// A segment matches a record by its exact name, or by its display name
    /// ignoring ASCII case. Empty segments are skipped, so `""` and `"/"`
    /// resolve to this node.
    pub fn lookup(&self, path: &str) -> Result<Node<'v, D>> {
        let mut current = self.clone();

        for segment in iter_path_segments(path) {
            if !current.is_dir()? {
                return Err(Error::NotADirectory);
            }

            current = current
                .find_child(segment)?
                .ok_or_else(|| Error::NotFound(segment.to_string()))?;
        }

        Ok(current)
    }

    fn find_child(&self, segment: &str) -> Result<Option<Node<'v, D>>> {
        for child in self.children()? {
            let matches =
                child.name() == segment || child.display_name().eq_ignore_ascii_case(segment);

            if matches && !child.is_volume_label()? {
                return Ok(Some(child));
            }
        }

        Ok(None)
    }
}
