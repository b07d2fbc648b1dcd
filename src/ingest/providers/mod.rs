pub mod substack_rss;
