pub mod news_list;
