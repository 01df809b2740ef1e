use crate::foundation::error::{ReelError, ReelResult};
use crate::model::clip::ClipEntry;

/// One of the three ordered parts of a [`Timeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    /// Template prefix.
    Pre,
    /// The operator's working list.
    User,
    /// Template suffix.
    Post,
}

/// Ordered clips to render: template prefix, user clips, template suffix.
///
/// The rendered order is always `pre ++ user ++ post`, recomputed on demand. The template sections
/// are only ever replaced wholesale; the user section is edited in place and never persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    pre: Vec<ClipEntry>,
    user: Vec<ClipEntry>,
    post: Vec<ClipEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(pre: Vec<ClipEntry>, post: Vec<ClipEntry>) -> Self {
        Self {
            pre,
            user: Vec::new(),
            post,
        }
    }

    pub fn pre(&self) -> &[ClipEntry] {
        &self.pre
    }

    pub fn user(&self) -> &[ClipEntry] {
        &self.user
    }

    pub fn post(&self) -> &[ClipEntry] {
        &self.post
    }

    pub fn section(&self, section: Section) -> &[ClipEntry] {
        match section {
            Section::Pre => &self.pre,
            Section::User => &self.user,
            Section::Post => &self.post,
        }
    }

    /// Replace both template sections, e.g. after loading or saving a template.
    pub fn replace_template(&mut self, pre: Vec<ClipEntry>, post: Vec<ClipEntry>) {
        self.pre = pre;
        self.post = post;
    }

    /// The only sequence that is ever rendered.
    pub fn effective_order(&self) -> Vec<&ClipEntry> {
        self.pre
            .iter()
            .chain(self.user.iter())
            .chain(self.post.iter())
            .collect()
    }

    pub fn effective_len(&self) -> usize {
        self.pre.len() + self.user.len() + self.post.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effective_len() == 0
    }

    /// Map a position in the effective order to its section and index within that section.
    pub fn locate(&self, effective_index: usize) -> Option<(Section, usize)> {
        let mut i = effective_index;
        for section in [Section::Pre, Section::User, Section::Post] {
            let len = self.section(section).len();
            if i < len {
                return Some((section, i));
            }
            i -= len;
        }
        None
    }

    pub fn has_placeholders(&self) -> bool {
        self.effective_order()
            .into_iter()
            .any(ClipEntry::has_placeholders)
    }

    pub fn push_clip(&mut self, clip: ClipEntry) -> ReelResult<()> {
        clip.validate()?;
        self.user.push(clip);
        Ok(())
    }

    pub fn insert_clip(&mut self, index: usize, clip: ClipEntry) -> ReelResult<()> {
        if index > self.user.len() {
            return Err(out_of_range(index, self.user.len()));
        }
        clip.validate()?;
        self.user.insert(index, clip);
        Ok(())
    }

    /// Replace the user clip at `index`, returning the previous one.
    pub fn replace_clip(&mut self, index: usize, clip: ClipEntry) -> ReelResult<ClipEntry> {
        let len = self.user.len();
        let slot = self.user.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
        clip.validate()?;
        Ok(std::mem::replace(slot, clip))
    }

    pub fn clip_mut(&mut self, index: usize) -> Option<&mut ClipEntry> {
        self.user.get_mut(index)
    }

    /// Remove a multi-selection of user clips. Nothing is removed if any index is out of range.
    pub fn remove_clips(&mut self, indices: &[usize]) -> ReelResult<Vec<ClipEntry>> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&bad) = sorted.iter().find(|&&i| i >= self.user.len()) {
            return Err(out_of_range(bad, self.user.len()));
        }

        let mut removed: Vec<ClipEntry> = sorted
            .iter()
            .rev()
            .map(|&i| self.user.remove(i))
            .collect();
        removed.reverse();
        Ok(removed)
    }

    pub fn clear_user(&mut self) {
        self.user.clear();
    }

    /// Move each selected user clip one step towards the start.
    ///
    /// A clip already at the top, or blocked by a selected clip that could not move, stays put.
    /// Returns the new indices of the selection, ascending.
    pub fn move_up(&mut self, indices: &[usize]) -> Vec<usize> {
        let selection = normalized_selection(indices, self.user.len());
        let mut floor = 0usize;
        let mut moved = Vec::with_capacity(selection.len());
        for idx in selection {
            if idx > floor {
                self.user.swap(idx - 1, idx);
                moved.push(idx - 1);
                floor = idx;
            } else {
                moved.push(idx);
                floor = idx + 1;
            }
        }
        moved
    }

    /// Move each selected user clip one step towards the end. Mirror of [`Self::move_up`].
    pub fn move_down(&mut self, indices: &[usize]) -> Vec<usize> {
        let selection = normalized_selection(indices, self.user.len());
        let mut ceiling = self.user.len();
        let mut moved = Vec::with_capacity(selection.len());
        for idx in selection.into_iter().rev() {
            if idx + 1 < ceiling {
                self.user.swap(idx, idx + 1);
                moved.push(idx + 1);
                ceiling = idx + 1;
            } else {
                moved.push(idx);
                ceiling = idx;
            }
        }
        moved.reverse();
        moved
    }
}

fn normalized_selection(indices: &[usize], len: usize) -> Vec<usize> {
    let mut s: Vec<usize> = indices.iter().copied().filter(|&i| i < len).collect();
    s.sort_unstable();
    s.dedup();
    s
}

fn out_of_range(index: usize, len: usize) -> ReelError {
    ReelError::validation(format!("clip index {index} out of range (len {len})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips(names: &[&str]) -> Vec<ClipEntry> {
        names.iter().map(|n| ClipEntry::new(format!("{n}.mp4"))).collect()
    }

    fn user_names(t: &Timeline) -> Vec<String> {
        t.user()
            .iter()
            .map(|c| c.path().file_stem().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn with_user(names: &[&str]) -> Timeline {
        let mut t = Timeline::with_template(clips(&["p"]), clips(&["q"]));
        for c in clips(names) {
            t.push_clip(c).unwrap();
        }
        t
    }

    #[test]
    fn locate_walks_sections() {
        let t = with_user(&["a", "b"]);
        assert_eq!(t.locate(0), Some((Section::Pre, 0)));
        assert_eq!(t.locate(1), Some((Section::User, 0)));
        assert_eq!(t.locate(2), Some((Section::User, 1)));
        assert_eq!(t.locate(3), Some((Section::Post, 0)));
        assert_eq!(t.locate(4), None);
    }

    #[test]
    fn move_up_keeps_blocks_together() {
        let mut t = with_user(&["a", "b", "c", "d"]);
        assert_eq!(t.move_up(&[1, 2]), vec![0, 1]);
        assert_eq!(user_names(&t), ["b", "c", "a", "d"]);

        assert_eq!(t.move_up(&[0, 1]), vec![0, 1]);
        assert_eq!(user_names(&t), ["b", "c", "a", "d"]);

        assert_eq!(t.move_up(&[0, 3, 9]), vec![0, 2]);
        assert_eq!(user_names(&t), ["b", "c", "d", "a"]);
    }

    #[test]
    fn move_down_mirrors_move_up() {
        let mut t = with_user(&["a", "b", "c", "d"]);
        assert_eq!(t.move_down(&[1, 2]), vec![2, 3]);
        assert_eq!(user_names(&t), ["a", "d", "b", "c"]);

        assert_eq!(t.move_down(&[2, 3]), vec![2, 3]);
        assert_eq!(user_names(&t), ["a", "d", "b", "c"]);
    }

    #[test]
    fn remove_clips_is_all_or_nothing() {
        let mut t = with_user(&["a", "b", "c"]);
        assert!(t.remove_clips(&[0, 7]).is_err());
        assert_eq!(t.user().len(), 3);

        let removed = t.remove_clips(&[2, 0, 2]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].path().to_str(), Some("a.mp4"));
        assert_eq!(user_names(&t), ["b"]);
    }

    #[test]
    fn replace_and_insert_validate_indices() {
        let mut t = with_user(&["a"]);
        assert!(t.insert_clip(5, ClipEntry::new("x.mp4")).is_err());
        t.insert_clip(0, ClipEntry::new("x.mp4")).unwrap();
        let old = t.replace_clip(1, ClipEntry::new("y.mp4")).unwrap();
        assert_eq!(old.path().to_str(), Some("a.mp4"));
        assert!(t.replace_clip(2, ClipEntry::new("z.mp4")).is_err());
        assert_eq!(user_names(&t), ["x", "y"]);
    }
}
