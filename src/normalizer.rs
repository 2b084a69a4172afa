//! Conversion of raw feed nodes into the public post shape

use crate::constants::endpoints;
use crate::models::{FeedNode, NormalizedPost};

/// Normalize a feed node, or `None` for video posts.
///
/// Only the first caption edge is used. Missing fields come through as
/// empty strings and zero counts.
pub fn normalize(node: &FeedNode) -> Option<NormalizedPost> {
    if node.is_video {
        return None;
    }

    Some(NormalizedPost {
        caption: node.first_caption().unwrap_or_default().to_string(),
        image_url: node.image_url.clone(),
        thumbnail_url: node.thumbnail_url.clone(),
        likes: node.likes.count,
        comments: node.comments.count,
        link: endpoints::post_link(&node.short_code),
    })
}

/// Normalize a page of nodes, dropping videos and keeping order
pub fn normalize_all<'a, I>(nodes: I) -> Vec<NormalizedPost>
where
    I: IntoIterator<Item = &'a FeedNode>,
{
    nodes.into_iter().filter_map(normalize).collect()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Videos never produce a post; photos always produce exactly one
        /// whose link is the permalink of the short code.
        #[test]
        fn property_normalize_video_filter(
            short_code in "[A-Za-z0-9_-]{1,12}",
            is_video in any::<bool>(),
            likes in any::<u64>(),
            comments in any::<u64>(),
        ) {
            let mut node = FeedNode::default();
            node.short_code = short_code.clone();
            node.is_video = is_video;
            node.likes.count = likes;
            node.comments.count = comments;

            match normalize(&node) {
                None => prop_assert!(is_video),
                Some(post) => {
                    prop_assert!(!is_video);
                    prop_assert_eq!(post.link, format!("https://instagram.com/p/{}", short_code));
                    prop_assert_eq!(post.likes, likes);
                    prop_assert_eq!(post.comments, comments);
                }
            }
        }
    }
}
