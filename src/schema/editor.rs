use crate::schema::field_model::{DataSource, Field};
use crate::schema::form_model::FormSchema;
use crate::store::ids;

// ============================================================================
// Builder-side editing of a form's field list
// ============================================================================
//
// Every edit keeps `order` equal to the field's index and touches `updatedAt`.

impl FormSchema {
    /// Insert `field` at `index` (clamped), or append.
    pub fn add_field(&mut self, field: Field, index: Option<usize>) {
        let at = index.unwrap_or(self.fields.len()).min(self.fields.len());
        self.fields.insert(at, field);
        self.renumber();
        self.touch();
    }

    /// Apply `edit` to the field with `id`. Returns whether it exists.
    pub fn update_field(&mut self, id: &str, edit: impl FnOnce(&mut Field)) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        edit(field);
        self.touch();
        true
    }

    /// Remove a field and unlink every dependency source that pointed at it.
    pub fn remove_field(&mut self, id: &str) -> Option<Field> {
        let index = self.fields.iter().position(|f| f.id == id)?;
        let removed = self.fields.remove(index);

        for field in &mut self.fields {
            if let Some(DataSource::Dependency(dep)) = field.data_source.as_mut() {
                dep.depends_on.unlink(id);
            }
        }

        self.renumber();
        self.touch();
        Some(removed)
    }

    /// Copy a field right after itself. Returns the new id.
    pub fn duplicate_field(&mut self, id: &str) -> Option<String> {
        let index = self.fields.iter().position(|f| f.id == id)?;
        let mut copy = self.fields[index].clone();
        copy.id = ids::field_id();
        copy.label = format!("{} (Copy)", copy.label);
        copy.name = format!("{}_copy", copy.name);

        let new_id = copy.id.clone();
        self.fields.insert(index + 1, copy);
        self.renumber();
        self.touch();
        Some(new_id)
    }

    /// Move `active` to the position currently held by `over`.
    pub fn reorder_fields(&mut self, active: &str, over: &str) -> bool {
        let from = self.fields.iter().position(|f| f.id == active);
        let to = self.fields.iter().position(|f| f.id == over);
        let (Some(from), Some(to)) = (from, to) else {
            return false;
        };
        if from == to {
            return true;
        }

        let moved = self.fields.remove(from);
        self.fields.insert(to, moved);
        self.renumber();
        self.touch();
        true
    }
}
